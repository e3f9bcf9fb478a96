// Copyright 2016 The Fancy Regex Authors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! Compilation of regex ASTs into match trees.
//!
//! Every expression becomes a sequence of nodes. Sequences are linked into chains where an
//! enclosing node needs one (a group body, an alternation branch, a conditional branch or the
//! whole pattern), and the nodes of the chain are then adopted by that node.

use crate::analyze::Info;
use crate::parse::{ClassItem, GroupKind, Switches};
use crate::vm::{Chain, Node, NodeId, NodeKind, Prog};
use crate::Expr;

struct Compiler {
    nodes: Vec<Node>,
}

impl Compiler {
    fn new() -> Compiler {
        Compiler { nodes: Vec::new() }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            next: None,
            prev: None,
            owner: None,
        });
        self.nodes.len() - 1
    }

    fn link(&mut self, seq: &[NodeId]) -> Option<Chain> {
        for pair in seq.windows(2) {
            self.nodes[pair[0]].next = Some(pair[1]);
            self.nodes[pair[1]].prev = Some(pair[0]);
        }
        match (seq.first(), seq.last()) {
            (Some(&head), Some(&tail)) => Some(Chain { head, tail }),
            _ => None,
        }
    }

    fn adopt(&mut self, chain: Option<Chain>, owner: NodeId) {
        let mut cur = chain.map(|chain| chain.head);
        while let Some(id) = cur {
            self.nodes[id].owner = Some(owner);
            cur = self.nodes[id].next;
        }
    }

    fn compile_chain(&mut self, info: &Info<'_>) -> Option<Chain> {
        let seq = self.compile_seq(info);
        self.link(&seq)
    }

    fn single(&mut self, kind: NodeKind) -> Vec<NodeId> {
        vec![self.push(kind)]
    }

    fn compile_seq(&mut self, info: &Info<'_>) -> Vec<NodeId> {
        match *info.expr {
            Expr::Empty => Vec::new(),
            Expr::Any => self.single(NodeKind::Any),
            Expr::Literal(ref val) => {
                if val.is_empty() {
                    return Vec::new();
                }
                let folded = val.to_ascii_lowercase().into();
                self.single(NodeKind::Lit {
                    val: val.clone(),
                    folded,
                })
            }
            Expr::Class { kind, invert } => self.single(NodeKind::Class { kind, invert }),
            Expr::Bracket {
                ref items,
                invert,
            } => match items[..] {
                [ClassItem::Range(lo, hi)] if !invert => self.single(NodeKind::Range { lo, hi }),
                _ => self.single(NodeKind::Bracket {
                    items: items.clone().into_boxed_slice(),
                    invert,
                }),
            },
            Expr::Assertion(assertion) => self.single(NodeKind::Assertion(assertion)),
            Expr::Backref(group) => self.single(NodeKind::Backref(group)),
            Expr::Concat(_) => {
                let mut seq = Vec::new();
                for child in &info.children {
                    seq.extend(self.compile_seq(child));
                }
                seq
            }
            Expr::Alt(_) => self.compile_alt(&info.children),
            Expr::Group {
                ref kind, switches, ..
            } => self.compile_group(&info.children[0], kind, switches),
            Expr::Repeat { lo, hi, greedy, .. } => {
                self.compile_repeat(info, &info.children[0], lo, hi, greedy)
            }
            Expr::Conditional { group, .. } => {
                let yes = self.compile_chain(&info.children[0]);
                let no = self.compile_chain(&info.children[1]);
                let id = self.push(NodeKind::Conditional { group, yes, no });
                self.adopt(yes, id);
                self.adopt(no, id);
                vec![id]
            }
        }
    }

    // `a|b|c` becomes `a|(b|c)`
    fn compile_alt(&mut self, children: &[Info<'_>]) -> Vec<NodeId> {
        match children.len() {
            0 => return Vec::new(),
            1 => return self.compile_seq(&children[0]),
            _ => {}
        }
        let chains = children
            .iter()
            .map(|child| self.compile_chain(child))
            .collect::<Vec<_>>();
        let mut rest = chains.iter().rev();
        let mut second = rest.next().copied().flatten();
        let mut id = 0;
        for &first in rest {
            id = self.push(NodeKind::Alt { first, second });
            self.adopt(first, id);
            self.adopt(second, id);
            second = Some(Chain { head: id, tail: id });
        }
        vec![id]
    }

    fn compile_group(
        &mut self,
        child: &Info<'_>,
        kind: &GroupKind,
        switches: Switches,
    ) -> Vec<NodeId> {
        let (index, look) = match *kind {
            GroupKind::NonCapture if switches.is_inherit() => return self.compile_seq(child),
            GroupKind::NonCapture => (None, None),
            GroupKind::Capture { index, .. } => (Some(index), None),
            GroupKind::LookAround(look) => (None, Some(look)),
        };
        let body = self.compile_chain(child);
        let id = self.push(NodeKind::Group {
            body,
            index,
            look,
            switches,
        });
        self.adopt(body, id);
        vec![id]
    }

    fn compile_repeat(
        &mut self,
        info: &Info<'_>,
        child: &Info<'_>,
        lo: usize,
        hi: usize,
        greedy: bool,
    ) -> Vec<NodeId> {
        let seq = self.compile_seq(child);
        let child = match seq[..] {
            [] => return Vec::new(),
            [single] => single,
            _ => {
                // a repeat holds one node, so longer sequences get a plain group
                let body = self.link(&seq);
                let id = self.push(NodeKind::Group {
                    body,
                    index: None,
                    look: None,
                    switches: Switches::default(),
                });
                self.adopt(body, id);
                id
            }
        };
        let id = self.push(NodeKind::Repeat {
            child,
            lo,
            hi,
            greedy,
            groups: info.groups(),
        });
        self.nodes[child].owner = Some(id);
        vec![id]
    }
}

/// Build the match tree for an analyzed expression.
pub(crate) fn compile(info: &Info<'_>, n_groups: usize) -> Prog {
    let mut c = Compiler::new();
    let root = c.compile_chain(info);
    Prog::new(c.nodes, root, n_groups, info.min_size)
}
