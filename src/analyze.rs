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

//! Analysis of regex expressions.

use std::cmp::min;
use std::ops::Range;

use crate::parse::{ExprTree, GroupKind};
use crate::CompileError;
use crate::Expr;
use crate::Result;

#[derive(Debug)]
pub struct Info<'a> {
    /// Number of capture groups opened before this expression
    pub(crate) start_group: usize,
    /// Number of capture groups opened up to the end of this expression
    pub(crate) end_group: usize,
    /// Minimum number of characters a match of this expression consumes
    pub(crate) min_size: usize,
    pub(crate) expr: &'a Expr,
    pub(crate) children: Vec<Info<'a>>,
}

impl<'a> Info<'a> {
    /// Indices of the capture groups inside this expression.
    pub(crate) fn groups(&self) -> Range<usize> {
        self.start_group + 1..self.end_group + 1
    }
}

struct Analyzer {
    group_ix: usize,
}

impl Analyzer {
    fn visit<'a>(&mut self, expr: &'a Expr) -> Result<Info<'a>> {
        let start_group = self.group_ix;
        let mut children = Vec::new();
        let mut min_size = 0;
        match *expr {
            Expr::Empty | Expr::Assertion(_) => {}
            Expr::Any | Expr::Class { .. } | Expr::Bracket { .. } => {
                min_size = 1;
            }
            Expr::Literal(ref val) => {
                min_size = val.chars().count();
            }
            Expr::Concat(ref v) => {
                for child in v {
                    let child_info = self.visit(child)?;
                    min_size += child_info.min_size;
                    children.push(child_info);
                }
            }
            Expr::Alt(ref v) => {
                let mut alt_min = usize::MAX;
                for child in v {
                    let child_info = self.visit(child)?;
                    alt_min = min(alt_min, child_info.min_size);
                    children.push(child_info);
                }
                min_size = if v.is_empty() { 0 } else { alt_min };
            }
            Expr::Group {
                ref child,
                ref kind,
                ..
            } => {
                if let GroupKind::Capture { .. } = kind {
                    self.group_ix += 1;
                }
                let child_info = self.visit(child)?;
                if !matches!(kind, GroupKind::LookAround(_)) {
                    min_size = child_info.min_size;
                }
                children.push(child_info);
            }
            Expr::Repeat { ref child, lo, .. } => {
                let child_info = self.visit(child)?;
                min_size = child_info.min_size.saturating_mul(lo);
                children.push(child_info);
            }
            Expr::Backref(group) => {
                self.check_group(group)?;
            }
            Expr::Conditional {
                group,
                ref yes,
                ref no,
            } => {
                self.check_group(group)?;
                let yes_info = self.visit(yes)?;
                let no_info = self.visit(no)?;
                min_size = min(yes_info.min_size, no_info.min_size);
                children.push(yes_info);
                children.push(no_info);
            }
        };

        Ok(Info {
            start_group,
            end_group: self.group_ix,
            min_size,
            expr,
            children,
        })
    }

    // a group may only be referenced once it has been opened
    fn check_group(&self, group: usize) -> Result<()> {
        if group == 0 || group > self.group_ix {
            return Err(CompileError::InvalidBackref(group).into());
        }
        Ok(())
    }
}

/// Validate group references and compute the static facts the compiler needs.
///
/// # Errors
///
/// Returns [`CompileError::InvalidBackref`] for a back-reference or condition naming a group that
/// is not opened before it.
pub fn analyze(tree: &ExprTree) -> Result<Info<'_>> {
    let mut analyzer = Analyzer { group_ix: 0 };

    analyzer.visit(&tree.expr)
}
