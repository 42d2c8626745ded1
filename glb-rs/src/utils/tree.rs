//! Tree rendering for scene hierarchies

use console::Style;

/// A node in a rendered tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    /// Key/value pairs shown under the node, in insertion order
    pub metadata: Vec<(String, String)>,
}

/// Kinds of entries in a scene tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Scene,
    Node,
    Mesh,
    Joint,
}

/// Options for tree rendering
#[derive(Debug, Clone, Default)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub no_color: bool,
    pub show_metadata: bool,
}

impl TreeNode {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
            metadata: Vec::new(),
        }
    }

    /// Add a child node
    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: &str, value: impl Into<String>) -> Self {
        self.metadata.push((key.to_string(), value.into()));
        self
    }
}

impl NodeType {
    /// Marker printed in front of the node name
    pub fn icon(self) -> &'static str {
        match self {
            NodeType::Scene => "◆",
            NodeType::Node => "●",
            NodeType::Mesh => "▲",
            NodeType::Joint => "◇",
        }
    }

    /// Color style for the node type
    pub fn style(self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                NodeType::Scene => Style::new().bold().cyan(),
                NodeType::Node => Style::new().green(),
                NodeType::Mesh => Style::new().magenta(),
                NodeType::Joint => Style::new().yellow(),
            }
        }
    }
}

/// Render a tree structure to a string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    output.push_str(&format!(
        "{}{}{} {}\n",
        prefix,
        connector,
        node.node_type.icon(),
        style.apply_to(&node.name)
    ));

    let child_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{}{}", prefix, if is_last { "    " } else { "│   " })
    };

    if options.show_metadata {
        let meta_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };
        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{}    {}: {}\n",
                child_prefix,
                meta_style.apply_to(key),
                value
            ));
        }
    }

    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        render_node(
            child,
            output,
            &child_prefix,
            is_last_child,
            depth + 1,
            options,
        );
    }
}
