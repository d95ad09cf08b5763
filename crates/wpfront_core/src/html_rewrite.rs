//! Image rewriting for rendered post HTML.
//!
//! The fragment is parsed with `scraper` and copied into an owned
//! [`HtmlNode`] tree. [`rewrite_node`] consumes a node and returns its
//! replacement, so an `<img>` can turn into a `<picture>` without touching
//! shared node identity. The tree is serialized back with the HTML
//! fragment serialization rules.

use scraper::{ElementRef, Html, Node};

use crate::media::{WEBP_MIME, is_uploads_url, webp_mirror_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    Element(HtmlElement),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<HtmlNode>,
}

impl HtmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_child(mut self, child: HtmlNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Adds lazy loading hints to every `<img>` and wraps images served from the
/// uploads directory in a `<picture>` with a WebP source.
pub fn transform_html_images(html: &str) -> String {
    let nodes = parse_fragment(html)
        .into_iter()
        .map(rewrite_node)
        .collect::<Vec<_>>();
    serialize_nodes(&nodes)
}

pub fn parse_fragment(html: &str) -> Vec<HtmlNode> {
    let fragment = Html::parse_fragment(html);
    convert_children(fragment.root_element())
}

fn convert_children(parent: ElementRef<'_>) -> Vec<HtmlNode> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        if let Node::Fragment = child.value() {
            // template contents
            for content in child.children() {
                push_node(&mut nodes, content.value(), ElementRef::wrap(content));
            }
        } else {
            push_node(&mut nodes, child.value(), ElementRef::wrap(child));
        }
    }
    nodes
}

fn push_node(nodes: &mut Vec<HtmlNode>, value: &Node, element: Option<ElementRef<'_>>) {
    match value {
        Node::Element(_) => {
            if let Some(element) = element {
                nodes.push(HtmlNode::Element(convert_element(element)));
            }
        }
        Node::Text(text) => nodes.push(HtmlNode::Text(text.text.to_string())),
        Node::Comment(comment) => nodes.push(HtmlNode::Comment(comment.comment.to_string())),
        _ => {}
    }
}

fn convert_element(element: ElementRef<'_>) -> HtmlElement {
    let value = element.value();
    let attrs = value
        .attrs
        .iter()
        .map(|(qual, text)| {
            let name = match &qual.prefix {
                Some(prefix) => format!("{prefix}:{}", qual.local),
                None => qual.local.to_string(),
            };
            (name, text.to_string())
        })
        .collect();
    HtmlElement {
        name: value.name().to_string(),
        attrs,
        children: convert_children(element),
    }
}

/// Returns the rewritten form of `node`. Elements are rewritten pre-order:
/// an element is handled first, then its children are mapped through the
/// same function. Inert `<template>` contents are kept as they are.
pub fn rewrite_node(node: HtmlNode) -> HtmlNode {
    match node {
        HtmlNode::Element(element) if element.name == "img" => rewrite_img(element),
        HtmlNode::Element(element) if element.name == "template" => HtmlNode::Element(element),
        HtmlNode::Element(mut element) => {
            element.children = rewrite_children(element.children);
            HtmlNode::Element(element)
        }
        other => other,
    }
}

fn rewrite_children(children: Vec<HtmlNode>) -> Vec<HtmlNode> {
    children.into_iter().map(rewrite_node).collect()
}

fn rewrite_img(mut img: HtmlElement) -> HtmlNode {
    if let Some(src) = img.attr("src").filter(|src| is_uploads_url(src)) {
        return HtmlNode::Element(picture_for(&img, src));
    }
    if !img.has_attr("loading") {
        img.attrs.push(("loading".to_string(), "lazy".to_string()));
    }
    if !img.has_attr("decoding") {
        img.attrs.push(("decoding".to_string(), "async".to_string()));
    }
    img.children = rewrite_children(img.children);
    HtmlNode::Element(img)
}

fn picture_for(img: &HtmlElement, src: &str) -> HtmlElement {
    let source = HtmlElement::new("source")
        .with_attr("srcset", &webp_mirror_url(src))
        .with_attr("type", WEBP_MIME);

    let mut fallback = HtmlElement::new("img")
        .with_attr("src", src)
        .with_attr("alt", img.attr("alt").unwrap_or(""))
        .with_attr("loading", "lazy")
        .with_attr("decoding", "async");
    for name in ["width", "height"] {
        if let Some(value) = img.attr(name) {
            fallback = fallback.with_attr(name, value);
        }
    }

    HtmlElement::new("picture")
        .with_child(HtmlNode::Element(source))
        .with_child(HtmlNode::Element(fallback))
}

pub fn serialize_nodes(nodes: &[HtmlNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node, None);
    }
    out
}

fn write_node(out: &mut String, node: &HtmlNode, parent: Option<&str>) {
    match node {
        HtmlNode::Element(element) => write_element(out, element),
        HtmlNode::Text(text) => {
            if parent.is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name)) {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        HtmlNode::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
    }
}

fn write_element(out: &mut String, element: &HtmlElement) {
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr_value(value));
        out.push('"');
    }
    out.push('>');
    if VOID_ELEMENTS.contains(&element.name.as_str()) {
        return;
    }
    // The parser drops one leading newline in these elements.
    if matches!(element.name.as_str(), "pre" | "textarea" | "listing") {
        if let Some(HtmlNode::Text(text)) = element.children.first() {
            if text.starts_with('\n') {
                out.push('\n');
            }
        }
    }
    for child in &element.children {
        write_node(out, child, Some(&element.name));
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

fn escape_attr_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
