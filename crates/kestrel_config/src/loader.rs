//! Configuration document parsing.

use roxmltree::{Document, Node, ParsingOptions};

use crate::document::ConfigNode;
use crate::error::ConfigError;
use crate::properties::{expand_placeholders, PropertyResolver};

/// Name of the mandatory root module.
pub const ROOT_MODULE: &str = "Checker";

/// Parses a configuration document from raw bytes.
///
/// The bytes must be UTF-8 XML whose root element is
/// `<module name="Checker">`. Each `<property name value [default]>` is
/// expanded against `resolver`. `<message>` and `<metadata>` elements are
/// accepted and ignored.
pub fn load_document(
    bytes: &[u8],
    resolver: &dyn PropertyResolver,
) -> Result<ConfigNode, ConfigError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ConfigError::Parse(format!("document is not valid UTF-8: {e}")))?;
    load_document_from_str(text, resolver)
}

/// Parses a configuration document from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_document_from_str(
    text: &str,
    resolver: &dyn PropertyResolver,
) -> Result<ConfigNode, ConfigError> {
    let opts = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, opts)
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    let root = doc.root_element();
    let node = parse_module(root, resolver)?;
    if node.name() != ROOT_MODULE {
        return Err(ConfigError::Schema(format!(
            "root module must be '{ROOT_MODULE}', found '{}'",
            node.name()
        )));
    }
    Ok(node)
}

fn parse_module(
    element: Node<'_, '_>,
    resolver: &dyn PropertyResolver,
) -> Result<ConfigNode, ConfigError> {
    if element.tag_name().name() != "module" {
        return Err(ConfigError::Schema(format!(
            "expected <module>, found <{}>",
            element.tag_name().name()
        )));
    }
    let name = element
        .attribute("name")
        .ok_or_else(|| ConfigError::Schema("<module> is missing a name".to_string()))?;
    let mut node = ConfigNode::new(name);

    for child in element.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "module" => node.add_child(parse_module(child, resolver)?),
            "property" => {
                let prop_name = child.attribute("name").ok_or_else(|| {
                    ConfigError::Schema(format!("<property> in '{name}' is missing a name"))
                })?;
                let raw = child.attribute("value").ok_or_else(|| {
                    ConfigError::Schema(format!(
                        "property '{prop_name}' in '{name}' is missing a value"
                    ))
                })?;
                let value = expand_placeholders(raw, resolver, child.attribute("default"))?;
                node.set_property(prop_name, value);
            }
            "message" | "metadata" => {}
            other => {
                return Err(ConfigError::Schema(format!(
                    "unexpected element <{other}> in module '{name}'"
                )))
            }
        }
    }
    Ok(node)
}
