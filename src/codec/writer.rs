//! Indented XML writer used by the encoder. Output is byte stable: the same
//! descriptor always serializes to the same text.

pub struct XmlWriter {
    data: String,
    open_elements: Vec<String>,
    tag_open: bool,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            data: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"),
            open_elements: Vec::new(),
            tag_open: false,
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.open_elements.len() {
            self.data.push_str("  ");
        }
    }

    fn close_open_tag(&mut self) {
        if self.tag_open {
            self.data.push_str(">\n");
            self.tag_open = false;
        }
    }

    /// Opens `<name`, leaving the tag open for attributes.
    pub fn start(&mut self, name: &str) {
        self.close_open_tag();
        self.indent();
        self.data.push('<');
        self.data.push_str(name);
        self.open_elements.push(name.to_string());
        self.tag_open = true;
    }

    pub fn attribute(&mut self, name: &str, value: &str) {
        debug_assert!(self.tag_open);
        self.data.push(' ');
        self.data.push_str(name);
        self.data.push_str("=\"");
        self.data.push_str(&escape(value));
        self.data.push('"');
    }

    /// Closes the innermost element, collapsing `<x></x>` to `<x/>` when it
    /// never received content.
    pub fn end(&mut self) {
        let name = self
            .open_elements
            .pop()
            .unwrap_or_else(|| unreachable!("end() without matching start()"));
        if self.tag_open {
            self.data.push_str("/>\n");
            self.tag_open = false;
        } else {
            self.indent();
            self.data.push_str("</");
            self.data.push_str(&name);
            self.data.push_str(">\n");
        }
    }

    /// Writes `<name>text</name>` on one line.
    pub fn text_element(&mut self, name: &str, text: &str) {
        self.close_open_tag();
        self.indent();
        self.data.push('<');
        self.data.push_str(name);
        self.data.push('>');
        self.data.push_str(&escape(text));
        self.data.push_str("</");
        self.data.push_str(name);
        self.data.push_str(">\n");
    }

    /// Writes `<name>true</name>` or `<name>false</name>`.
    pub fn bool_element(&mut self, name: &str, value: bool) {
        self.text_element(name, if value { "true" } else { "false" });
    }

    pub fn finish(mut self) -> String {
        self.close_open_tag();
        debug_assert!(self.open_elements.is_empty());
        self.data
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_elements_are_indented_two_spaces() {
        let mut w = XmlWriter::new();
        w.start("confs");
        w.start("conf");
        w.attribute("name", "Debug");
        w.text_element("compilerSet", "default");
        w.end();
        w.end();
        assert_eq!(
            w.finish(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <confs>\n  <conf name=\"Debug\">\n    <compilerSet>default</compilerSet>\n  \
             </conf>\n</confs>\n"
        );
    }

    #[test]
    fn childless_element_collapses_to_self_closing() {
        let mut w = XmlWriter::new();
        w.start("item");
        w.attribute("path", "main.c");
        w.end();
        assert_eq!(
            w.finish(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<item path=\"main.c\"/>\n"
        );
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut w = XmlWriter::new();
        w.start("element");
        w.attribute("commonFlags", "-D'NAME=\"x\"' <y>");
        w.end();
        let out = w.finish();
        assert!(out.contains("&quot;"));
        assert!(out.contains("&lt;y&gt;"));
        assert!(!out.contains("<y>"));
    }
}
