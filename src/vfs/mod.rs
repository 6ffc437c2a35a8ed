mod fake_fs;
mod node;
pub(crate) mod path;
mod real_fs;

pub use fake_fs::FakeFs;
pub use node::{DirNode, FileNode, Node, NodeKind};
pub use real_fs::RealFs;
