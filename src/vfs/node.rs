use std::collections::BTreeMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Directory,
}

/// An entry in the virtual tree. Directories own their children directly;
/// there are no back-pointers, so the tree cannot form cycles and every node
/// has exactly one owner.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    File(FileNode),
    Dir(DirNode),
}

impl Node {
    pub fn file(content: &[u8], modified: u64) -> Node {
        Node::File(FileNode {
            content: content.to_vec(),
            modified,
        })
    }

    pub fn dir() -> Node {
        Node::Dir(DirNode::new())
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File(_) => NodeKind::File,
            Node::Dir(_) => NodeKind::Directory,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind() == NodeKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == NodeKind::Directory
    }
}

/// A file entry: byte content plus a logical last-modified tick. The tick
/// comes from a counter owned by the filesystem state, never from the clock,
/// so repeated runs see identical metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FileNode {
    content: Vec<u8>,
    modified: u64,
}

impl FileNode {
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn modified(&self) -> u64 {
        self.modified
    }

    pub fn set_content(&mut self, content: &[u8], modified: u64) {
        self.content = content.to_vec();
        self.modified = modified;
    }

    pub fn append_content(&mut self, content: &[u8], modified: u64) {
        self.content.extend_from_slice(content);
        self.modified = modified;
    }
}

/// A directory entry: a name-to-node mapping. `BTreeMap` keeps listings
/// deterministic (sorted by name) without extra bookkeeping.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirNode {
    children: BTreeMap<String, Node>,
}

impl DirNode {
    pub fn new() -> DirNode {
        DirNode::default()
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(name)
    }

    pub fn insert(&mut self, name: String, node: Node) {
        self.children.insert(name, node);
    }

    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.children.remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.children.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.children.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
