//! MIPI Sys-T XML collateral
//!
//! Trace analysis tools consume the catalog as a Sys-T collateral file.
//! Zero-argument messages go under `syst:Short32`; everything else under
//! `syst:Catalog32` with the format text rewritten to printf conversions.

use super::enums::EnumTables;
use crate::config::CollateralInfo;
use crate::encoding::Encoding;
use crate::format_string::to_printf;
use crate::types::{Message, Module};

const SYST_NS: &str = "http://www.mipi.org/1.0/sys-t";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://www.mipi.org/1.0/sys-t https://www.mipi.org/schema/sys-t/sys-t_1-0.xsd";

const SHORT32_MASK: &str = "0x0FFFFFFF";
const CATALOG32_MASK: &str = "0xFFFFFFFF";

/// A minimal element tree
#[derive(Debug, Clone)]
struct Element {
    name: &'static str,
    attrs: Vec<(&'static str, String)>,
    cdata: Option<String>,
    children: Vec<Element>,
}

impl Element {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            attrs: Vec::new(),
            cdata: None,
            children: Vec::new(),
        }
    }

    fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    fn cdata(mut self, text: impl Into<String>) -> Self {
        self.cdata = Some(text.into());
        self
    }

    fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    fn write(&self, out: &mut String, depth: usize) {
        let indent = "    ".repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(self.name);
        for (name, value) in &self.attrs {
            out.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
        }

        match (&self.cdata, self.children.is_empty()) {
            (None, true) => out.push_str(" />\n"),
            (Some(text), true) => {
                out.push('>');
                out.push_str(&cdata(text));
                out.push_str(&format!("</{}>\n", self.name));
            }
            (_, false) => {
                out.push_str(">\n");
                for child in &self.children {
                    child.write(out, depth + 1);
                }
                out.push_str(&format!("{}</{}>\n", indent, self.name));
            }
        }
    }
}

fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("&#10;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap text in a CDATA section, splitting any `]]>` it contains
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

/// printf rendering of a message's format text
pub fn printf_text(message: &Message) -> String {
    let specs: Vec<&str> = message
        .arg_types
        .iter()
        .map(|tag| Encoding::parse(tag).map_or("%d", |encoding| encoding.printf_spec()))
        .collect();
    to_printf(&message.text, &specs)
}

/// `"arg:enum"` for the first argument of a known enum type
fn enum_lookup(message: &Message, enums: &EnumTables) -> Option<String> {
    super::json::enum_lookup(&message.arg_types, enums)
        .first()
        .map(|(arg, index)| format!("{}:{}", arg, index))
}

fn format_element(message: &Message, id: u32, mask: &str, enums: &EnumTables) -> Element {
    let mut element = Element::new("syst:Format")
        .attr("ID", format!("0x{:08X}", id))
        .attr("Mask", mask);

    let text = if message.arg_types.is_empty() {
        message.text.clone()
    } else {
        if let Some(lookup) = enum_lookup(message, enums) {
            element = element.attr("EnumLookup", lookup);
        }
        printf_text(message)
    };
    element.cdata(text)
}

/// Render the collateral document
///
/// Records without an ID are skipped.
pub fn to_string(
    messages: &[Message],
    modules: &[Module],
    enums: &EnumTables,
    collateral: &CollateralInfo,
) -> String {
    let guids = Element::new("syst:Guids").child(
        Element::new("syst:Guid")
            .attr("ID", collateral.guid.as_str())
            .attr("Mask", collateral.guid_mask.as_str()),
    );

    let enum_definition = Element::new("syst:EnumDefinition").children(
        enums.iter().enumerate().map(|(index, (name, table))| {
            Element::new("syst:Enum")
                .attr("Name", name)
                .attr("ID", index.to_string())
                .children(table.iter().map(|(value, symbol)| {
                    Element::new("syst:EnumEntry")
                        .attr("Value", value.to_string())
                        .attr("Name", symbol.as_str())
                }))
        }),
    );

    let module_elements = Element::new("syst:Modules").children(modules.iter().filter_map(|module| {
        Some(
            Element::new("syst:Module")
                .attr("ID", module.id?.to_string())
                .cdata(module.text.as_str()),
        )
    }));

    let (short, catalog): (Vec<&Message>, Vec<&Message>) = messages
        .iter()
        .filter(|message| message.id.is_some())
        .partition(|message| message.arg_types.is_empty());

    let short32 = Element::new("syst:Short32").children(short.into_iter().filter_map(|message| {
        Some(format_element(message, message.id?, SHORT32_MASK, enums))
    }));
    let catalog32 = Element::new("syst:Catalog32").children(catalog.into_iter().filter_map(|message| {
        Some(format_element(message, message.id?, CATALOG32_MASK, enums))
    }));

    let mut client = Element::new("syst:Client")
        .attr("Name", collateral.client_name.as_str())
        .child(guids);
    if !enums.is_empty() {
        client = client.child(enum_definition);
    }
    let client = client.child(module_elements).child(short32).child(catalog32);

    let root = Element::new("syst:Collateral")
        .attr("xmlns:syst", SYST_NS)
        .attr("xmlns:xsi", XSI_NS)
        .attr("xsi:schemaLocation", SCHEMA_LOCATION)
        .child(client)
        .child(Element::new("syst:FwVersion").attr("FW_Version", collateral.fw_version.as_str()));

    let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    root.write(&mut out, 0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::enums::EnumTable;

    fn render(messages: &[Message], modules: &[Module], enums: &EnumTables) -> String {
        to_string(messages, modules, enums, &CollateralInfo::default())
    }

    #[test]
    fn test_short_and_catalog_groups() {
        let messages = vec![
            Message::new("boot complete", vec![]).with_id(9),
            Message::new("value: {} {:08x}", vec!["encode_32<int>".into(), "encode_u32<unsigned int>".into()])
                .with_id(5),
        ];
        let xml = render(&messages, &[Module::new("core").with_id(2)], &EnumTables::new());

        assert!(xml.contains(
            "<syst:Format ID=\"0x00000009\" Mask=\"0x0FFFFFFF\"><![CDATA[boot complete]]></syst:Format>"
        ));
        assert!(xml.contains(
            "<syst:Format ID=\"0x00000005\" Mask=\"0xFFFFFFFF\"><![CDATA[value: %d %08x]]></syst:Format>"
        ));
        assert!(xml.contains("<syst:Module ID=\"2\"><![CDATA[core]]></syst:Module>"));
        assert!(xml.contains("<syst:Client Name=\"CIB Framework FW\">"));
        assert!(xml.contains("<syst:FwVersion FW_Version=\"VERSION\" />"));
        assert!(xml.contains(
            "<syst:Guid ID=\"{00000000-0017-0001-0000-000000000000}\" Mask=\"{00000000-FFFF-FFFF-8000-000000000000}\" />"
        ));
        assert!(!xml.contains("EnumDefinition"));

        let short = xml.find("<syst:Short32>").unwrap();
        let catalog = xml.find("<syst:Catalog32>").unwrap();
        assert!(short < catalog);
    }

    #[test]
    fn test_printf_conversion() {
        let message = Message::new(
            "{} {} {} {} 100% {{x}}",
            vec![
                "encode_u64<unsigned long>".into(),
                "encode_u32<float>".into(),
                "encode_64<long>".into(),
                "bogus".into(),
            ],
        );
        assert_eq!(printf_text(&message), "%llu %f %lld %d 100%% {x}");
    }

    #[test]
    fn test_enum_definition_and_lookup() {
        let mut enums = EnumTables::new();
        enums.insert(
            "ns::E1",
            EnumTable::from([(19, "VAL_E1".to_string()), (20, "A&B".to_string())]),
        );
        let messages = vec![Message::new("e: {}", vec!["encode_enum<ns::E1, int>".into()]).with_id(1)];
        let xml = render(&messages, &[], &enums);

        assert!(xml.contains("<syst:Enum Name=\"ns::E1\" ID=\"0\">"));
        assert!(xml.contains("<syst:EnumEntry Value=\"19\" Name=\"VAL_E1\" />"));
        assert!(xml.contains("<syst:EnumEntry Value=\"20\" Name=\"A&amp;B\" />"));
        assert!(xml.contains("EnumLookup=\"0:0\"><![CDATA[e: %d]]>"));
    }

    #[test]
    fn test_cdata_terminator_split() {
        assert_eq!(cdata("a]]>b"), "<![CDATA[a]]]]><![CDATA[>b]]>");
    }
}
