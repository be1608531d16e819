use crate::types::PrefixId;

/// A node in the binary prefix trie. `data` is `None` for nodes that only
/// exist to keep the path to a more specific prefix connected ("glue"
/// nodes in classic radix-tree terms); it becomes `Some` the moment the
/// prefix itself is `add`-ed.
pub(crate) struct Node<T> {
    pub(crate) prefix: PrefixId,
    pub(crate) data: Option<T>,
    pub(crate) left: Option<Box<Node<T>>>,
    pub(crate) right: Option<Box<Node<T>>>,
}

impl<T> Node<T> {
    pub(crate) fn new(prefix: PrefixId) -> Self {
        Node {
            prefix,
            data: None,
            left: None,
            right: None,
        }
    }
}
