//! The finger tree's node and digit layout.
//!
//! `Node<T>` is deliberately *depth-erased*: a node at any depth in the tree
//! is either a `Leaf` holding one element directly, or a 2/3-ary internal
//! node whose children are themselves `Rc<Node<T>>`. The alternative — a
//! fully typed `FingerTree<Node<Node<...T>>>` nesting — cannot be expressed
//! for a depth that is only known at run time, since Rust's generics
//! monomorphize. This plays the role the teacher's tagged, variable-arity
//! `Branch2..Branch256` family (`src/patch/branch.rs`) plays for its cuckoo
//! trie: one uniform recursive shape instead of one type per arity or depth.

use std::rc::Rc;

use itertools::Itertools;

/// A node in the finger tree: either a single element, or an internal node
/// grouping 2 or 3 children one level down. The `usize` cached on the
/// internal variants is the number of leaves reachable from this node.
#[derive(Clone)]
pub(super) enum Node<T> {
    Leaf(T),
    Node2(usize, Rc<Node<T>>, Rc<Node<T>>),
    Node3(usize, Rc<Node<T>>, Rc<Node<T>>, Rc<Node<T>>),
}

impl<T> Node<T> {
    pub(super) fn size(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Node2(size, ..) => *size,
            Node::Node3(size, ..) => *size,
        }
    }
}

impl<T: Clone> Node<T> {
    pub(super) fn node2(a: Rc<Node<T>>, b: Rc<Node<T>>) -> Rc<Node<T>> {
        let size = a.size() + b.size();
        Rc::new(Node::Node2(size, a, b))
    }

    pub(super) fn node3(a: Rc<Node<T>>, b: Rc<Node<T>>, c: Rc<Node<T>>) -> Rc<Node<T>> {
        let size = a.size() + b.size() + c.size();
        Rc::new(Node::Node3(size, a, b, c))
    }

    /// The children of an internal node. Never called on a `Leaf`: by the
    /// finger tree's depth invariant, any node reached while descending
    /// into a `Deep`'s `middle` is always `Node2`/`Node3`.
    pub(super) fn children(&self) -> Vec<Rc<Node<T>>> {
        match self {
            Node::Leaf(_) => unreachable!("children() called on a leaf node"),
            Node::Node2(_, a, b) => vec![Rc::clone(a), Rc::clone(b)],
            Node::Node3(_, a, b, c) => vec![Rc::clone(a), Rc::clone(b), Rc::clone(c)],
        }
    }

    /// Converts an internal node into the digit holding the same children,
    /// one level shallower. The counterpart of [`super::Digit::to_tree`],
    /// used by `pull_left`/`pull_right` when a node is promoted out of the
    /// middle tree into a digit position.
    pub(super) fn to_digit(&self) -> Digit<T> {
        match self {
            Node::Leaf(_) => unreachable!("to_digit() called on a leaf node"),
            Node::Node2(_, a, b) => Digit::Two(Rc::clone(a), Rc::clone(b)),
            Node::Node3(_, a, b, c) => Digit::Three(Rc::clone(a), Rc::clone(b), Rc::clone(c)),
        }
    }

    pub(super) fn get(&self, index: usize) -> &T {
        match self {
            Node::Leaf(value) => value,
            Node::Node2(_, a, b) => {
                let sa = a.size();
                if index < sa {
                    a.get(index)
                } else {
                    b.get(index - sa)
                }
            }
            Node::Node3(_, a, b, c) => {
                let sa = a.size();
                if index < sa {
                    a.get(index)
                } else {
                    let sb = b.size();
                    if index < sa + sb {
                        b.get(index - sa)
                    } else {
                        c.get(index - sa - sb)
                    }
                }
            }
        }
    }

    pub(super) fn set(&self, index: usize, value: T) -> Rc<Node<T>> {
        match self {
            Node::Leaf(_) => Rc::new(Node::Leaf(value)),
            Node::Node2(size, a, b) => {
                let sa = a.size();
                if index < sa {
                    Rc::new(Node::Node2(*size, a.set(index, value), Rc::clone(b)))
                } else {
                    Rc::new(Node::Node2(*size, Rc::clone(a), b.set(index - sa, value)))
                }
            }
            Node::Node3(size, a, b, c) => {
                let sa = a.size();
                if index < sa {
                    Rc::new(Node::Node3(
                        *size,
                        a.set(index, value),
                        Rc::clone(b),
                        Rc::clone(c),
                    ))
                } else {
                    let sb = b.size();
                    if index < sa + sb {
                        Rc::new(Node::Node3(
                            *size,
                            Rc::clone(a),
                            b.set(index - sa, value),
                            Rc::clone(c),
                        ))
                    } else {
                        Rc::new(Node::Node3(
                            *size,
                            Rc::clone(a),
                            Rc::clone(b),
                            c.set(index - sa - sb, value),
                        ))
                    }
                }
            }
        }
    }

    pub(super) fn reversed(&self) -> Rc<Node<T>> {
        match self {
            Node::Leaf(value) => Rc::new(Node::Leaf(value.clone())),
            Node::Node2(size, a, b) => Rc::new(Node::Node2(*size, b.reversed(), a.reversed())),
            Node::Node3(size, a, b, c) => {
                Rc::new(Node::Node3(*size, c.reversed(), b.reversed(), a.reversed()))
            }
        }
    }

}

/// A finger of 1..4 children at one end of a `Deep` tree (or the children
/// of an internal node, converted up one level).
#[derive(Clone)]
pub(super) enum Digit<T> {
    One(Rc<Node<T>>),
    Two(Rc<Node<T>>, Rc<Node<T>>),
    Three(Rc<Node<T>>, Rc<Node<T>>, Rc<Node<T>>),
    Four(Rc<Node<T>>, Rc<Node<T>>, Rc<Node<T>>, Rc<Node<T>>),
}

impl<T> Digit<T> {
    pub(super) fn size(&self) -> usize {
        match self {
            Digit::One(a) => a.size(),
            Digit::Two(a, b) => a.size() + b.size(),
            Digit::Three(a, b, c) => a.size() + b.size() + c.size(),
            Digit::Four(a, b, c, d) => a.size() + b.size() + c.size() + d.size(),
        }
    }

    pub(super) fn is_full(&self) -> bool {
        matches!(self, Digit::Four(..))
    }
}

impl<T: Clone> Digit<T> {
    pub(super) fn to_vec(&self) -> Vec<Rc<Node<T>>> {
        match self {
            Digit::One(a) => vec![Rc::clone(a)],
            Digit::Two(a, b) => vec![Rc::clone(a), Rc::clone(b)],
            Digit::Three(a, b, c) => vec![Rc::clone(a), Rc::clone(b), Rc::clone(c)],
            Digit::Four(a, b, c, d) => vec![Rc::clone(a), Rc::clone(b), Rc::clone(c), Rc::clone(d)],
        }
    }

    /// Builds a digit from 1..=4 children. Panics if the slice is the wrong
    /// length — every call site constructs `nodes` to satisfy this itself.
    pub(super) fn from_vec(nodes: Vec<Rc<Node<T>>>) -> Digit<T> {
        let mut it = nodes.into_iter();
        match (it.next(), it.next(), it.next(), it.next()) {
            (Some(a), None, None, None) => Digit::One(a),
            (Some(a), Some(b), None, None) => Digit::Two(a, b),
            (Some(a), Some(b), Some(c), None) => Digit::Three(a, b, c),
            (Some(a), Some(b), Some(c), Some(d)) => Digit::Four(a, b, c, d),
            _ => panic!("digit must have between 1 and 4 children"),
        }
    }

    pub(super) fn push_front(&self, node: Rc<Node<T>>) -> Digit<T> {
        match self {
            Digit::One(a) => Digit::Two(node, Rc::clone(a)),
            Digit::Two(a, b) => Digit::Three(node, Rc::clone(a), Rc::clone(b)),
            Digit::Three(a, b, c) => Digit::Four(node, Rc::clone(a), Rc::clone(b), Rc::clone(c)),
            Digit::Four(..) => unreachable!("push_front on a full digit"),
        }
    }

    pub(super) fn push_back(&self, node: Rc<Node<T>>) -> Digit<T> {
        match self {
            Digit::One(a) => Digit::Two(Rc::clone(a), node),
            Digit::Two(a, b) => Digit::Three(Rc::clone(a), Rc::clone(b), node),
            Digit::Three(a, b, c) => Digit::Four(Rc::clone(a), Rc::clone(b), Rc::clone(c), node),
            Digit::Four(..) => unreachable!("push_back on a full digit"),
        }
    }

    /// Removes the first child, returning it and the remainder (`None` if
    /// this was the only child).
    pub(super) fn pop_front(&self) -> (Rc<Node<T>>, Option<Digit<T>>) {
        match self {
            Digit::One(a) => (Rc::clone(a), None),
            Digit::Two(a, b) => (Rc::clone(a), Some(Digit::One(Rc::clone(b)))),
            Digit::Three(a, b, c) => (
                Rc::clone(a),
                Some(Digit::Two(Rc::clone(b), Rc::clone(c))),
            ),
            Digit::Four(a, b, c, d) => (
                Rc::clone(a),
                Some(Digit::Three(Rc::clone(b), Rc::clone(c), Rc::clone(d))),
            ),
        }
    }

    pub(super) fn pop_back(&self) -> (Rc<Node<T>>, Option<Digit<T>>) {
        match self {
            Digit::One(a) => (Rc::clone(a), None),
            Digit::Two(a, b) => (Rc::clone(b), Some(Digit::One(Rc::clone(a)))),
            Digit::Three(a, b, c) => (
                Rc::clone(c),
                Some(Digit::Two(Rc::clone(a), Rc::clone(b))),
            ),
            Digit::Four(a, b, c, d) => (
                Rc::clone(d),
                Some(Digit::Three(Rc::clone(a), Rc::clone(b), Rc::clone(c))),
            ),
        }
    }

    pub(super) fn get(&self, index: usize) -> &T {
        let mut offset = 0;
        for child in self.children_ref() {
            let sz = child.size();
            if index - offset < sz {
                return child.get(index - offset);
            }
            offset += sz;
        }
        unreachable!("index out of range within digit")
    }

    fn children_ref(&self) -> Vec<&Rc<Node<T>>> {
        match self {
            Digit::One(a) => vec![a],
            Digit::Two(a, b) => vec![a, b],
            Digit::Three(a, b, c) => vec![a, b, c],
            Digit::Four(a, b, c, d) => vec![a, b, c, d],
        }
    }


    pub(super) fn set(&self, index: usize, value: T) -> Digit<T> {
        let nodes = self.to_vec();
        let mut offset = 0;
        let mut new_nodes = Vec::with_capacity(nodes.len());
        for node in nodes {
            let sz = node.size();
            // Only the hit child's branch may subtract `offset` from
            // `index`; once it has matched, `offset` runs ahead of `index`
            // for every remaining sibling, so they must be copied
            // unexamined rather than re-checked.
            if offset <= index && index < offset + sz {
                new_nodes.push(node.set(index - offset, value.clone()));
            } else {
                new_nodes.push(node);
            }
            offset += sz;
        }
        Digit::from_vec(new_nodes)
    }

    pub(super) fn reversed(&self) -> Digit<T> {
        let mut nodes: Vec<Rc<Node<T>>> = self.to_vec().into_iter().map(|n| n.reversed()).collect();
        nodes.reverse();
        Digit::from_vec(nodes)
    }

    /// Promotes a digit's children into a tree at the same depth, used by
    /// `pull_left`/`pull_right` when the middle tree runs dry and the far
    /// digit has to stand in for the whole subtree.
    pub(super) fn to_tree(&self) -> super::FingerTree<T> {
        super::tree_from_items(self.to_vec())
    }
}

/// Splits a 1..4-length list of sized children at the one containing
/// `index`, returning the children before it (if any), the hit child, and
/// the children after it (if any). Shared by digit-level and node-level
/// splitting since both operate on a small `Vec<Rc<Node<T>>>`.
pub(super) fn split_children<T: Clone>(
    index: usize,
    children: Vec<Rc<Node<T>>>,
) -> (Option<Digit<T>>, Rc<Node<T>>, Option<Digit<T>>) {
    let mut offset = 0;
    for (i, child) in children.iter().enumerate() {
        let sz = child.size();
        if index - offset < sz {
            let left: Vec<_> = children[..i].to_vec();
            let right: Vec<_> = children[i + 1..].to_vec();
            let hit = Rc::clone(child);
            let left = if left.is_empty() { None } else { Some(Digit::from_vec(left)) };
            let right = if right.is_empty() { None } else { Some(Digit::from_vec(right)) };
            return (left, hit, right);
        }
        offset += sz;
    }
    unreachable!("index out of range while splitting children")
}

/// Groups the "glue" list used by finger tree concatenation — at the top
/// level this is always 2..=8 nodes (the two digits either side of the
/// splice point), but recursive calls one level down pass along an
/// already-grouped list, so no fixed upper bound is assumed here.
pub(super) fn group_pair<T: Clone>(nodes: Vec<Rc<Node<T>>>) -> Vec<Rc<Node<T>>> {
    debug_assert!(nodes.len() >= 2);
    if nodes.len() == 2 {
        let mut it = nodes.into_iter();
        let a = it.next().unwrap();
        let b = it.next().unwrap();
        return vec![Node::node2(a, b)];
    }
    group_into_nodes(nodes)
}

/// Groups an arbitrary-length (>= 3) list of nodes into `Node2`/`Node3`s
/// using the `n mod 3` remainder pattern: packed as size-3 groups from the
/// front, with the final 0/4/5 leftover elements packed as 3, (2,2) or
/// (3,2) respectively so that every group stays within the 2..=3 arity a
/// `Node` is allowed to have.
pub(super) fn group_into_nodes<T: Clone>(nodes: Vec<Rc<Node<T>>>) -> Vec<Rc<Node<T>>> {
    let n = nodes.len();
    debug_assert!(n >= 3);
    let tail_len = match n % 3 {
        0 => 0,
        1 => 4,
        2 => 5,
        _ => unreachable!(),
    };
    let front_len = n - tail_len;
    debug_assert_eq!(front_len % 3, 0);

    let mut it = nodes.into_iter();
    let mut result = Vec::with_capacity(front_len / 3 + 2);
    for (a, b, c) in it.by_ref().take(front_len).tuples() {
        result.push(Node::node3(a, b, c));
    }
    let tail: Vec<_> = it.collect();
    match tail.len() {
        0 => {}
        4 => {
            let (a, b, c, d) = tail.into_iter().next_tuple().unwrap();
            result.push(Node::node2(a, b));
            result.push(Node::node2(c, d));
        }
        5 => {
            let (a, b, c, d, e) = tail.into_iter().next_tuple().unwrap();
            result.push(Node::node3(a, b, c));
            result.push(Node::node2(d, e));
        }
        _ => unreachable!(),
    }
    result
}
