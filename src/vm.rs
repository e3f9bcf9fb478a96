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

//! Backtracking matcher over a tree of match nodes.
//!
//! A compiled pattern is an arena of [`Node`]s addressed by index. Every node sits in a chain:
//! `next` and `prev` link it to its neighbours and `owner` names the node holding the chain (a
//! group, an alternation, a conditional or a repeat), or `None` for the top-level chain.
//!
//! Matching is continuation passing. [`Session::run_node`] matches one node at a cursor and, on
//! success, goes on to match the rest of the chain. It only reports success once the whole
//! remainder, including the closing of every enclosing group and everything after it, has
//! matched. Failure is `None`, and the caller then tries its next choice. Only alternations and
//! repeats have choices, so backtracking falls out of the recursion.
//!
//! When a chain runs out, what happens depends on its owner:
//!
//! * a group is closed: its saved flags (and, for look-around, its saved cursor) are popped and
//!   matching continues after the group;
//! * an alternation or conditional continues after itself;
//! * a repeat returns the cursor, because each iteration of a repeat is matched on its own and the
//!   repeat itself drives the remainder;
//! * the top-level chain reports the final cursor.
//!
//! A group that was closed but whose remainder then failed is re-opened, pushing its state back,
//! so that choices inside the group can be retried with consistent stacks.
//!
//! Matching right to left (for look-behind, or a reverse search) walks chains from `tail` over
//! `prev` and makes every consuming node step back one codepoint.
//!
//! The nesting depth of the recursion follows the structure of the pattern rather than the
//! length of the input, since repeat iterations return before the next one starts. It is still
//! bounded by a configurable limit.

use bit_set::BitSet;
use compact_str::CompactString;
use log::trace;
use std::fmt;
use std::ops::Range;

use crate::charclass::{is_word_byte, ClassKind};
use crate::error::RuntimeError;
use crate::parse::{Assertion, ClassItem, LookAround, Switches};
use crate::utf8util::{decode, decode_before};
use crate::Error;
use crate::Flags;
use crate::Result;

pub(crate) const DEFAULT_MAX_DEPTH: usize = 384;

/// Index of a node in [`Prog::nodes`].
pub type NodeId = usize;

/// First and last node of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chain {
    /// Where forward matching starts
    pub head: NodeId,
    /// Where backward matching starts
    pub tail: NodeId,
}

/// What a node matches.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// Literal text
    Lit {
        /// The text
        val: CompactString,
        /// The text with ASCII letters lowercased, for case-insensitive matching
        folded: CompactString,
    },
    /// Any character, excluding line terminators unless dot-matches-newline is on
    Any,
    /// Predefined class
    Class {
        /// Which class
        kind: ClassKind,
        /// Match everything outside the class instead
        invert: bool,
    },
    /// Inclusive range of codepoints
    Range {
        /// Lowest codepoint
        lo: char,
        /// Highest codepoint
        hi: char,
    },
    /// Bracket class; items are tried in order
    Bracket {
        /// The alternatives
        items: Box<[ClassItem]>,
        /// Match everything outside the class instead
        invert: bool,
    },
    /// Repeat a single node
    Repeat {
        /// The repeated node; it has no neighbours
        child: NodeId,
        /// Minimum number of iterations
        lo: usize,
        /// Maximum number of iterations (or `usize::MAX`)
        hi: usize,
        /// Prefer more iterations
        greedy: bool,
        /// Capture groups inside the child, restored when backtracking over iterations
        groups: Range<usize>,
    },
    /// Ordered choice between two chains; `None` is the empty chain
    Alt {
        /// Tried first
        first: Option<Chain>,
        /// Tried if the first branch and its remainder fail
        second: Option<Chain>,
    },
    /// Group around a chain
    Group {
        /// The body; `None` is the empty chain
        body: Option<Chain>,
        /// Capture index for capturing groups
        index: Option<usize>,
        /// Look-around kind; look-around groups restore the cursor when closed
        look: Option<LookAround>,
        /// Flag changes applied to the body
        switches: Switches,
    },
    /// Back reference to the text captured by a group
    Backref(usize),
    /// Zero-width assertion
    Assertion(Assertion),
    /// Choose a chain depending on whether a group has been captured
    Conditional {
        /// The group tested
        group: usize,
        /// Matched if the group is set
        yes: Option<Chain>,
        /// Matched otherwise
        no: Option<Chain>,
    },
}

/// A node of the match tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// What the node matches
    pub kind: NodeKind,
    /// Successor in the chain
    pub next: Option<NodeId>,
    /// Predecessor in the chain
    pub prev: Option<NodeId>,
    /// The node holding this node's chain
    pub owner: Option<NodeId>,
}

/// A compiled pattern: the node arena and its top-level chain.
#[derive(Debug, Clone)]
pub struct Prog {
    /// All nodes of the pattern
    pub nodes: Vec<Node>,
    /// Top-level chain, `None` for the empty pattern
    pub root: Option<Chain>,
    pub(crate) n_groups: usize,
    pub(crate) min_size: usize,
}

impl Prog {
    pub(crate) fn new(
        nodes: Vec<Node>,
        root: Option<Chain>,
        n_groups: usize,
        min_size: usize,
    ) -> Prog {
        Prog {
            nodes,
            root,
            n_groups,
            min_size,
        }
    }
}

impl fmt::Display for Prog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            Some(root) => writeln!(f, "root: {}..{}", root.head, root.tail)?,
            None => writeln!(f, "root: empty")?,
        }
        for (i, node) in self.nodes.iter().enumerate() {
            write!(f, "{:3}: {:?}", i, node.kind)?;
            if let Some(next) = node.next {
                write!(f, " next={}", next)?;
            }
            if let Some(owner) = node.owner {
                write!(f, " owner={}", owner)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Per-call matching state.
#[derive(Debug)]
pub(crate) struct Session<'p, 't> {
    prog: &'p Prog,
    text: &'t str,
    /// Flags the call started with
    initial: Flags,
    /// Flags in effect at the current node
    flags: Flags,
    /// Capture slots, two per group; `usize::MAX` is unset
    saves: Vec<usize>,
    /// Flags of the enclosing scope, one entry per open group
    flag_stack: Vec<Flags>,
    /// Cursor at entry, one entry per open look-around group
    cursor_stack: Vec<usize>,
    /// Groups currently open
    open: BitSet,
    /// Cursor after each greedy iteration still available for backtracking
    positions: Vec<usize>,
    /// Saved capture slots of groups inside repeats
    snapshots: Vec<usize>,
    depth: usize,
    max_depth: usize,
}

impl<'p, 't> Session<'p, 't> {
    pub(crate) fn new(prog: &'p Prog, text: &'t str, flags: Flags, max_depth: usize) -> Self {
        Session {
            prog,
            text,
            initial: flags,
            flags,
            saves: vec![usize::MAX; (prog.n_groups + 1) * 2],
            flag_stack: Vec::new(),
            cursor_stack: Vec::new(),
            open: BitSet::with_capacity(prog.nodes.len()),
            positions: Vec::new(),
            snapshots: Vec::new(),
            depth: 0,
            max_depth,
        }
    }

    /// Try start positions in `range` (from the end when matching in reverse) and return the
    /// capture slots of the first match. With `anchored`, only the first position is tried.
    ///
    /// Forward candidates are `range.start..range.end`; reverse ones run from `range.end` down
    /// to `range.start`. A range starting at or past the end of the text never matches.
    pub(crate) fn run(
        &mut self,
        range: Range<usize>,
        anchored: bool,
    ) -> Result<Option<Vec<usize>>> {
        let min_size = self.prog.min_size;
        let len = self.text.len();
        if range.start >= len {
            return Ok(None);
        }
        if self.initial.contains(Flags::REVERSE) {
            let mut pos = range.end;
            loop {
                if pos < min_size {
                    break;
                }
                if self.text.is_char_boundary(pos) {
                    if let Some(start) = self.try_at(pos)? {
                        return Ok(Some(self.finish(start, pos)));
                    }
                }
                if anchored || pos <= range.start {
                    break;
                }
                pos -= 1;
            }
        } else {
            let mut pos = range.start;
            while pos < range.end {
                if len - pos < min_size {
                    break;
                }
                if self.text.is_char_boundary(pos) {
                    if let Some(end) = self.try_at(pos)? {
                        return Ok(Some(self.finish(pos, end)));
                    }
                }
                if anchored {
                    break;
                }
                pos += 1;
            }
        }
        Ok(None)
    }

    fn try_at(&mut self, pos: usize) -> Result<Option<usize>> {
        trace!("try at {}", pos);
        self.reset();
        self.run_chain(None, self.prog.root, pos)
    }

    fn reset(&mut self) {
        self.flags = self.initial;
        self.saves.iter_mut().for_each(|slot| *slot = usize::MAX);
        self.flag_stack.clear();
        self.cursor_stack.clear();
        self.open.clear();
        self.positions.clear();
        self.snapshots.clear();
        self.depth = 0;
    }

    fn finish(&mut self, start: usize, end: usize) -> Vec<usize> {
        self.saves[0] = start;
        self.saves[1] = end;
        self.saves.clone()
    }

    fn is_reverse(&self) -> bool {
        self.flags.contains(Flags::REVERSE)
    }

    fn is_casei(&self) -> bool {
        self.flags.contains(Flags::CASE_INSENSITIVE)
    }

    // chain traversal

    fn run_chain(
        &mut self,
        owner: Option<NodeId>,
        chain: Option<Chain>,
        ix: usize,
    ) -> Result<Option<usize>> {
        match chain {
            Some(chain) if self.is_reverse() => self.run_node(chain.tail, ix),
            Some(chain) => self.run_node(chain.head, ix),
            None => self.chain_end(owner, ix),
        }
    }

    fn run_remain(&mut self, id: NodeId, ix: usize) -> Result<Option<usize>> {
        let node = &self.prog.nodes[id];
        let succ = if self.is_reverse() {
            node.prev
        } else {
            node.next
        };
        match succ {
            Some(succ) => self.run_node(succ, ix),
            None => self.chain_end(node.owner, ix),
        }
    }

    fn chain_end(&mut self, owner: Option<NodeId>, ix: usize) -> Result<Option<usize>> {
        let owner = match owner {
            Some(owner) => owner,
            None => return Ok(Some(ix)),
        };
        match self.prog.nodes[owner].kind {
            NodeKind::Group { index, look, .. } => self.close_group(owner, index, look, ix),
            NodeKind::Repeat { .. } => Ok(Some(ix)),
            _ => self.run_remain(owner, ix),
        }
    }

    fn descend(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(Error::RuntimeError(RuntimeError::StackOverflow));
        }
        self.depth += 1;
        Ok(())
    }

    fn run_node(&mut self, id: NodeId, ix: usize) -> Result<Option<usize>> {
        self.descend()?;
        let result = self.run_node_inner(id, ix);
        self.depth -= 1;
        result
    }

    fn run_node_inner(&mut self, id: NodeId, ix: usize) -> Result<Option<usize>> {
        let prog = self.prog;
        let node = &prog.nodes[id];
        trace!("{:>6} {:>4}: {:?}", ix, id, node.kind);
        match node.kind {
            NodeKind::Lit {
                ref val,
                ref folded,
            } => match self.step_lit(val, folded, ix) {
                Some(next) => self.run_remain(id, next),
                None => Ok(None),
            },
            NodeKind::Any
            | NodeKind::Class { .. }
            | NodeKind::Range { .. }
            | NodeKind::Bracket { .. } => match self.step_char(&node.kind, ix) {
                Some(next) => self.run_remain(id, next),
                None => Ok(None),
            },
            NodeKind::Assertion(assertion) => {
                if self.check_assertion(assertion, ix) {
                    self.run_remain(id, ix)
                } else {
                    Ok(None)
                }
            }
            NodeKind::Backref(group) => match self.step_backref(group, ix) {
                Some(next) => self.run_remain(id, next),
                None => Ok(None),
            },
            NodeKind::Repeat {
                child,
                lo,
                hi,
                greedy,
                ref groups,
            } => {
                if greedy {
                    self.run_greedy(id, child, lo, hi, groups, ix)
                } else {
                    self.run_lazy(id, child, lo, hi, groups, ix)
                }
            }
            NodeKind::Alt { first, second } => {
                if let Some(end) = self.run_chain(Some(id), first, ix)? {
                    return Ok(Some(end));
                }
                self.run_chain(Some(id), second, ix)
            }
            NodeKind::Group {
                body,
                index,
                look,
                switches,
            } => self.run_group(id, body, index, look, switches, ix),
            NodeKind::Conditional { group, yes, no } => {
                let chain = if self.is_set(group) { yes } else { no };
                self.run_chain(Some(id), chain, ix)
            }
        }
    }

    // groups

    // Look-behind runs against the current direction and everything else along it, so inside
    // a reverse search a look-ahead scans left and a look-behind scans right.
    fn group_flags(&self, look: Option<LookAround>, switches: Switches) -> Flags {
        let flags = switches.apply(self.flags);
        let behind = look.map_or(false, LookAround::is_behind);
        if behind != self.flags.contains(Flags::REVERSE) {
            flags | Flags::REVERSE
        } else {
            flags - Flags::REVERSE
        }
    }

    fn run_group(
        &mut self,
        id: NodeId,
        body: Option<Chain>,
        index: Option<usize>,
        look: Option<LookAround>,
        switches: Switches,
        ix: usize,
    ) -> Result<Option<usize>> {
        let outer = self.flags;
        let negative = look.map_or(false, LookAround::is_negative);
        let saved = index.map(|i| self.capture(i));
        if let Some(i) = index {
            self.set_capture_edge(i, ix, true);
        }
        self.flag_stack.push(outer);
        if look.is_some() {
            self.cursor_stack.push(ix);
        }
        self.open.insert(id);
        self.flags = self.group_flags(look, switches);
        trace!("open group {} at {}", id, ix);

        let result = self.run_chain(Some(id), body, ix)?;
        let closed = !self.open.contains(id);
        if closed && !negative {
            return Ok(result);
        }

        // the body failed, or a negative look-around body matched
        self.open.remove(id);
        self.flags = outer;
        self.flag_stack.pop();
        if look.is_some() {
            self.cursor_stack.pop();
        }
        if let (Some(i), Some(saved)) = (index, saved) {
            self.restore_capture(i, saved);
        }
        if negative && !closed {
            self.run_remain(id, ix)
        } else {
            Ok(None)
        }
    }

    fn close_group(
        &mut self,
        id: NodeId,
        index: Option<usize>,
        look: Option<LookAround>,
        ix: usize,
    ) -> Result<Option<usize>> {
        if look.map_or(false, LookAround::is_negative) {
            // the body matched; the group itself unwinds and fails
            self.open.remove(id);
            return Ok(None);
        }
        let inner = self.flags;
        let outer = self.flag_stack.pop().unwrap_or(self.initial);
        let cursor = if look.is_some() {
            self.cursor_stack.pop()
        } else {
            None
        };
        self.open.remove(id);
        self.flags = outer;
        let saved = index.map(|i| self.capture(i));
        if let Some(i) = index {
            self.set_capture_edge(i, ix, false);
        }
        trace!("close group {} at {}", id, ix);

        self.descend()?;
        let result = self.run_remain(id, cursor.unwrap_or(ix));
        self.depth -= 1;
        let result = result?;
        if result.is_none() {
            // re-open so that choices inside the group can be retried
            if let (Some(i), Some(saved)) = (index, saved) {
                self.restore_capture(i, saved);
            }
            self.flags = inner;
            self.flag_stack.push(outer);
            if let Some(cursor) = cursor {
                self.cursor_stack.push(cursor);
            }
            self.open.insert(id);
        }
        Ok(result)
    }

    // captures

    fn capture(&self, group: usize) -> (usize, usize) {
        (self.saves[group * 2], self.saves[group * 2 + 1])
    }

    fn restore_capture(&mut self, group: usize, (start, end): (usize, usize)) {
        self.saves[group * 2] = start;
        self.saves[group * 2 + 1] = end;
    }

    // When matching forward a group opens at its start and closes at its end; in reverse the
    // other way around.
    fn set_capture_edge(&mut self, group: usize, ix: usize, opening: bool) {
        let slot = if opening != self.is_reverse() {
            group * 2
        } else {
            group * 2 + 1
        };
        self.saves[slot] = ix;
    }

    fn is_set(&self, group: usize) -> bool {
        let (start, end) = self.capture(group);
        start != usize::MAX && end != usize::MAX
    }

    fn push_snapshot(&mut self, groups: &Range<usize>) {
        if !groups.is_empty() {
            let slots = &self.saves[groups.start * 2..groups.end * 2];
            self.snapshots.extend_from_slice(slots);
        }
    }

    fn pop_snapshot(&mut self, groups: &Range<usize>) {
        if groups.is_empty() {
            return;
        }
        let n = groups.len() * 2;
        let top = self.snapshots.len() - n;
        self.saves[groups.start * 2..groups.end * 2].copy_from_slice(&self.snapshots[top..]);
        self.snapshots.truncate(top);
    }

    // repeats

    fn run_greedy(
        &mut self,
        id: NodeId,
        child: NodeId,
        lo: usize,
        hi: usize,
        groups: &Range<usize>,
        ix: usize,
    ) -> Result<Option<usize>> {
        let snapshot_base = self.snapshots.len();
        self.push_snapshot(groups);
        let mut ix = ix;
        for _ in 0..lo {
            match self.run_node(child, ix)? {
                Some(next) => ix = next,
                None => {
                    self.pop_snapshot(groups);
                    return Ok(None);
                }
            }
        }

        let position_base = self.positions.len();
        self.positions.push(ix);
        self.push_snapshot(groups);
        let mut count = lo;
        while count < hi {
            match self.run_node(child, ix)? {
                // an empty iteration would repeat forever
                Some(next) if next != ix => {
                    ix = next;
                    count += 1;
                    self.positions.push(ix);
                    self.push_snapshot(groups);
                }
                _ => break,
            }
        }

        while self.positions.len() > position_base {
            let pos = match self.positions.pop() {
                Some(pos) => pos,
                None => break,
            };
            self.pop_snapshot(groups);
            if let Some(end) = self.run_remain(id, pos)? {
                self.positions.truncate(position_base);
                self.snapshots.truncate(snapshot_base);
                return Ok(Some(end));
            }
        }
        self.pop_snapshot(groups);
        Ok(None)
    }

    fn run_lazy(
        &mut self,
        id: NodeId,
        child: NodeId,
        lo: usize,
        hi: usize,
        groups: &Range<usize>,
        ix: usize,
    ) -> Result<Option<usize>> {
        let snapshot_base = self.snapshots.len();
        self.push_snapshot(groups);
        let mut ix = ix;
        for _ in 0..lo {
            match self.run_node(child, ix)? {
                Some(next) => ix = next,
                None => {
                    self.pop_snapshot(groups);
                    return Ok(None);
                }
            }
        }

        let mut count = lo;
        loop {
            if let Some(end) = self.run_remain(id, ix)? {
                self.snapshots.truncate(snapshot_base);
                return Ok(Some(end));
            }
            if count >= hi {
                break;
            }
            match self.run_node(child, ix)? {
                Some(next) if next != ix => {
                    ix = next;
                    count += 1;
                }
                _ => break,
            }
        }
        self.pop_snapshot(groups);
        Ok(None)
    }

    // single steps

    fn step_lit(&self, val: &str, folded: &str, ix: usize) -> Option<usize> {
        let bytes = self.text.as_bytes();
        let n = val.len();
        let start = if self.is_reverse() {
            ix.checked_sub(n)?
        } else {
            ix
        };
        let hay = bytes.get(start..start + n)?;
        let matched = if self.is_casei() {
            hay.iter()
                .zip(folded.bytes())
                .all(|(a, b)| a.to_ascii_lowercase() == b)
        } else {
            hay == val.as_bytes()
        };
        if !matched {
            return None;
        }
        Some(if self.is_reverse() { start } else { start + n })
    }

    fn step_char(&self, kind: &NodeKind, ix: usize) -> Option<usize> {
        let bytes = self.text.as_bytes();
        let (c, next) = if self.is_reverse() {
            let (c, len) = decode_before(bytes, ix)?;
            (c, ix - len)
        } else {
            let (c, len) = decode(bytes, ix)?;
            (c, ix + len)
        };
        if self.char_matches(kind, c) {
            Some(next)
        } else {
            None
        }
    }

    fn char_matches(&self, kind: &NodeKind, c: char) -> bool {
        let casei = self.is_casei();
        match *kind {
            NodeKind::Any => {
                self.flags.contains(Flags::DOT_MATCHES_NEW_LINE) || (c != '\n' && c != '\r')
            }
            NodeKind::Class { kind, invert } => kind.matches(c, casei) != invert,
            NodeKind::Range { lo, hi } => range_matches(lo, hi, c, casei),
            NodeKind::Bracket { ref items, invert } => {
                items.iter().any(|item| item_matches(*item, c, casei)) != invert
            }
            _ => false,
        }
    }

    fn step_backref(&self, group: usize, ix: usize) -> Option<usize> {
        let (lo, hi) = self.capture(group);
        if lo == usize::MAX || hi == usize::MAX || lo > hi {
            return None;
        }
        let bytes = self.text.as_bytes();
        let captured = &bytes[lo..hi];
        let n = captured.len();
        let start = if self.is_reverse() {
            ix.checked_sub(n)?
        } else {
            ix
        };
        let hay = bytes.get(start..start + n)?;
        let matched = if self.is_casei() {
            hay.eq_ignore_ascii_case(captured)
        } else {
            hay == captured
        };
        if !matched {
            return None;
        }
        Some(if self.is_reverse() { start } else { start + n })
    }

    fn check_assertion(&self, assertion: Assertion, ix: usize) -> bool {
        let bytes = self.text.as_bytes();
        let len = bytes.len();
        let multi_line = self.flags.contains(Flags::MULTI_LINE);
        let is_newline = |b: u8| b == b'\n' || b == b'\r';
        let word_before = ix > 0 && is_word_byte(bytes[ix - 1]);
        let word_after = ix < len && is_word_byte(bytes[ix]);
        match assertion {
            Assertion::StartText => ix == 0,
            Assertion::StartLine => ix == 0 || (multi_line && is_newline(bytes[ix - 1])),
            Assertion::EndText => ix == len,
            Assertion::EndLine => ix == len || (multi_line && is_newline(bytes[ix])),
            Assertion::EndTextOptionalNewline => {
                ix == len
                    || (ix + 1 == len && is_newline(bytes[ix]))
                    || (ix + 2 == len && &bytes[ix..] == b"\r\n")
            }
            Assertion::WordStart => word_after && !word_before,
            Assertion::WordEnd => word_before && !word_after,
            Assertion::WordBoundary => word_before != word_after,
            Assertion::NotWordBoundary => word_before == word_after,
        }
    }
}

fn swap_ascii_case(c: char) -> char {
    if c.is_ascii_lowercase() {
        c.to_ascii_uppercase()
    } else {
        c.to_ascii_lowercase()
    }
}

fn range_matches(lo: char, hi: char, c: char, casei: bool) -> bool {
    let range = lo..=hi;
    range.contains(&c) || (casei && c.is_ascii_alphabetic() && range.contains(&swap_ascii_case(c)))
}

fn item_matches(item: ClassItem, c: char, casei: bool) -> bool {
    match item {
        ClassItem::Char(x) => x == c || (casei && x.eq_ignore_ascii_case(&c)),
        ClassItem::Range(lo, hi) => range_matches(lo, hi, c, casei),
        ClassItem::Class(kind, invert) => kind.matches(c, casei) != invert,
    }
}
