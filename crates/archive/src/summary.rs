//! Serializable overview of a node tree, used by `podarchive show`.

use serde::Serialize;
use std::fmt::Write;

use crate::error::{optional, Result};
use crate::media::MediaType;
use crate::node::{Node, NodeKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    pub kind: NodeKind,
    pub file_id: String,
    /// Absent when the node has no name to derive a title from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Media types that have a source file.
    pub sources: Vec<MediaType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSummary>,
}

impl NodeSummary {
    /// Summarize `node` and everything below it, children ordered by
    /// file_id.
    pub fn collect(node: &Node) -> Result<Self> {
        let summarize = || -> Result<(String, Option<String>, Vec<MediaType>)> {
            let mut sources = Vec::new();
            for media_type in node.media_types()? {
                if optional(node.input_file(media_type))?.flatten().is_some() {
                    sources.push(media_type);
                }
            }
            Ok((node.file_id()?, optional(node.title())?, sources))
        };
        let (file_id, title, sources) = summarize().map_err(|e| e.in_node(node.to_string()))?;

        let mut children = node
            .children()
            .map_err(|e| e.in_node(node.to_string()))?
            .map(|child| {
                child
                    .map_err(|e| e.in_node(node.to_string()))
                    .and_then(|child| Self::collect(&child))
            })
            .collect::<Result<Vec<_>>>()?;
        children.sort_by(|a, b| a.file_id.cmp(&b.file_id));

        Ok(Self {
            kind: node.kind(),
            file_id,
            title,
            sources,
            children,
        })
    }

    /// Indented text rendering, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let _ = write!(out, "{:indent$}{} {}", "", self.kind, self.file_id, indent = depth * 2);
        if let Some(title) = &self.title {
            let _ = write!(out, "  \"{}\"", title);
        }
        if !self.sources.is_empty() {
            let sources: Vec<&str> = self.sources.iter().map(MediaType::as_str).collect();
            let _ = write!(out, "  [{}]", sources.join(", "));
        }
        out.push('\n');

        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}
