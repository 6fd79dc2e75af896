//! Render output.

use lumen_dom::{DomResult, Element, Node, TextNode};

/// What a component's `render` callback returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum View {
	/// Nothing; the host ends up with no children.
	#[default]
	Empty,
	/// A single node.
	Node(Node),
	/// Several sibling nodes.
	Fragment(Vec<Node>),
}

impl View {
	/// A view holding a single text node.
	pub fn text(data: impl Into<String>) -> Self {
		Self::Node(TextNode::new(data).into())
	}

	/// A view from any sequence of nodes.
	pub fn fragment<I, N>(nodes: I) -> Self
	where
		I: IntoIterator<Item = N>,
		N: Into<Node>,
	{
		Self::Fragment(nodes.into_iter().map(Into::into).collect())
	}

	/// The nodes of this view in order.
	pub fn into_nodes(self) -> Vec<Node> {
		match self {
			Self::Empty => Vec::new(),
			Self::Node(node) => vec![node],
			Self::Fragment(nodes) => nodes,
		}
	}

	/// Replaces `host`'s children with this view.
	///
	/// Nodes that were already children of `host` stay attached, so elements
	/// reused across renders keep their state and bindings.
	pub fn patch(self, host: &Element) -> DomResult<()> {
		host.replace_children(self.into_nodes())
	}
}

impl From<Node> for View {
	fn from(node: Node) -> Self {
		Self::Node(node)
	}
}

impl From<Element> for View {
	fn from(element: Element) -> Self {
		Self::Node(element.into())
	}
}

impl From<TextNode> for View {
	fn from(text: TextNode) -> Self {
		Self::Node(text.into())
	}
}

impl From<Vec<Node>> for View {
	fn from(nodes: Vec<Node>) -> Self {
		Self::Fragment(nodes)
	}
}

impl From<&str> for View {
	fn from(text: &str) -> Self {
		Self::text(text)
	}
}

impl From<String> for View {
	fn from(text: String) -> Self {
		Self::text(text)
	}
}

impl<V: Into<View>> From<Option<V>> for View {
	fn from(view: Option<V>) -> Self {
		view.map_or(Self::Empty, Into::into)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_patch_replaces_children() {
		let host = Element::new("x-host");
		View::text("old").patch(&host).unwrap();

		View::fragment([Element::new("b"), Element::new("i")])
			.patch(&host)
			.unwrap();

		assert_eq!(host.to_html(), "<x-host><b></b><i></i></x-host>");
	}

	#[rstest]
	fn test_patch_keeps_reused_nodes() {
		let host = Element::new("x-host");
		let kept = TextNode::new("kept");
		View::from(kept.clone()).patch(&host).unwrap();
		kept.set_data("still here");

		View::fragment([Node::from(&kept), TextNode::new("!").into()])
			.patch(&host)
			.unwrap();

		assert_eq!(host.text_content(), "still here!");
		assert!(host.children()[0].as_text().unwrap().ptr_eq(&kept));
	}

	#[rstest]
	fn test_empty_and_none_clear_host() {
		let host = Element::new("x-host");
		View::text("x").patch(&host).unwrap();

		View::from(None::<String>).patch(&host).unwrap();

		assert_eq!(host.child_count(), 0);
	}
}
