//! Position bookkeeping for text edits applied to the in-memory tree.
//!
//! A [`TextShift`] describes one replacement in a file. Applying it to a
//! node moves every range that lies after the replaced text so the tree
//! keeps matching the edited buffer.

use super::nodes::{
    Annotation, Arg, ClassDefinition, Expr, FunctionBody, FunctionDefinition, Ident, ImportDecl,
    ListenerDecl, ModuleMember, ModuleVariable, ObjectField, Param, RawRange, RecordField,
    ServiceDecl, Stmt, TypeDefinition, TypeDesc, TypeDescriptor,
};
use super::project::SourceFile;

/// A point in raw coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Point {
    line: u32,
    column: u32,
    offset: u32,
}

/// Effect of replacing a range of a file with new text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextShift {
    /// End of the replaced text before the edit
    old_end: Point,
    /// End of the inserted text after the edit
    new_end: Point,
}

impl TextShift {
    /// Replacement of `replaced` by `text`.
    pub fn replace(replaced: RawRange, text: &str) -> Self {
        let len = text.len() as u32;
        let new_end = match text.rfind('\n') {
            Some(last) => Point {
                line: replaced.start_line + text.matches('\n').count() as u32,
                column: (text.len() - last - 1) as u32,
                offset: replaced.start_offset + len,
            },
            None => Point {
                line: replaced.start_line,
                column: replaced.start_column + len,
                offset: replaced.start_offset + len,
            },
        };
        Self {
            old_end: Point {
                line: replaced.end_line,
                column: replaced.end_column,
                offset: replaced.end_offset,
            },
            new_end,
        }
    }

    /// Insertion of `text` at `line:column`, byte `offset`.
    pub fn insert(line: u32, column: u32, offset: u32, text: &str) -> Self {
        Self::replace(RawRange::new(line, column, line, column, offset, offset), text)
    }

    /// Range covering the inserted text, starting where the replaced range
    /// started.
    pub fn inserted(&self, replaced: RawRange) -> RawRange {
        RawRange::new(
            replaced.start_line,
            replaced.start_column,
            self.new_end.line,
            self.new_end.column,
            replaced.start_offset,
            self.new_end.offset,
        )
    }

    /// Move `range` if it lies after the edit. A range ending exactly where
    /// the edit ends keeps its end; one starting there moves.
    pub fn apply(&self, range: &mut RawRange) {
        let empty = range.start_offset == range.end_offset;
        let start = self.map(
            Point {
                line: range.start_line,
                column: range.start_column,
                offset: range.start_offset,
            },
            true,
        );
        let end = self.map(
            Point {
                line: range.end_line,
                column: range.end_column,
                offset: range.end_offset,
            },
            empty,
        );
        *range = RawRange::new(
            start.line,
            start.column,
            end.line,
            end.column,
            start.offset,
            end.offset,
        );
    }

    fn map(&self, point: Point, inclusive: bool) -> Point {
        let after = point.offset > self.old_end.offset
            || (inclusive && point.offset == self.old_end.offset);
        if !after {
            return point;
        }
        let offset = point.offset - self.old_end.offset + self.new_end.offset;
        if point.line == self.old_end.line {
            Point {
                line: self.new_end.line,
                column: point.column.saturating_sub(self.old_end.column) + self.new_end.column,
                offset,
            }
        } else {
            Point {
                line: point.line - self.old_end.line + self.new_end.line,
                column: point.column,
                offset,
            }
        }
    }
}

impl SourceFile {
    /// Move every range of the file that lies after the edit.
    pub fn shift(&mut self, shift: &TextShift) {
        for member in &mut self.members {
            member.shift(shift);
        }
    }
}

impl ModuleMember {
    /// Move every range of this member (nested nodes included) that lies
    /// after the edit.
    pub fn shift(&mut self, shift: &TextShift) {
        self.visit_ranges(&mut |range: &mut RawRange| shift.apply(range));
    }
}

// ============================================================================
// RANGE TRAVERSAL
// ============================================================================

/// Visits every [`RawRange`] stored in a node and its children.
trait VisitRanges {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange));
}

impl VisitRanges for RawRange {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        f(self);
    }
}

impl<T: VisitRanges> VisitRanges for Option<T> {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        if let Some(inner) = self {
            inner.visit_ranges(f);
        }
    }
}

impl<T: VisitRanges> VisitRanges for Vec<T> {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        for item in self {
            item.visit_ranges(f);
        }
    }
}

impl<T: VisitRanges> VisitRanges for Box<T> {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        self.as_mut().visit_ranges(f);
    }
}

impl VisitRanges for Ident {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        f(&mut self.range);
    }
}

impl VisitRanges for TypeDesc {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        f(&mut self.range);
    }
}

impl VisitRanges for Annotation {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        f(&mut self.range);
    }
}

impl VisitRanges for ModuleMember {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        match self {
            ModuleMember::Import(m) => m.visit_ranges(f),
            ModuleMember::Listener(m) => m.visit_ranges(f),
            ModuleMember::Service(m) => m.visit_ranges(f),
            ModuleMember::Type(m) => m.visit_ranges(f),
            ModuleMember::Class(m) => m.visit_ranges(f),
            ModuleMember::Variable(m) => m.visit_ranges(f),
            ModuleMember::Function(m) => m.visit_ranges(f),
            ModuleMember::Unknown { range } => f(range),
        }
    }
}

impl VisitRanges for ImportDecl {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        f(&mut self.range);
    }
}

impl VisitRanges for ListenerDecl {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        self.name.visit_ranges(f);
        self.type_desc.visit_ranges(f);
        self.init.visit_ranges(f);
        f(&mut self.range);
    }
}

impl VisitRanges for ServiceDecl {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        self.annotations.visit_ranges(f);
        self.type_desc.visit_ranges(f);
        self.attach_points.visit_ranges(f);
        self.fields.visit_ranges(f);
        self.functions.visit_ranges(f);
        f(&mut self.open_brace);
        f(&mut self.range);
    }
}

impl VisitRanges for ObjectField {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        self.name.visit_ranges(f);
        self.type_desc.visit_ranges(f);
        self.init.visit_ranges(f);
        f(&mut self.range);
    }
}

impl VisitRanges for TypeDefinition {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        self.name.visit_ranges(f);
        match &mut self.descriptor {
            TypeDescriptor::Record { fields, open_brace } => {
                fields.visit_ranges(f);
                f(open_brace);
            }
            TypeDescriptor::Enum { members } => members.visit_ranges(f),
            TypeDescriptor::Other { .. } => {}
        }
        f(&mut self.range);
    }
}

impl VisitRanges for RecordField {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        self.name.visit_ranges(f);
        self.type_desc.visit_ranges(f);
        f(&mut self.range);
    }
}

impl VisitRanges for ClassDefinition {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        self.name.visit_ranges(f);
        self.fields.visit_ranges(f);
        self.methods.visit_ranges(f);
        f(&mut self.open_brace);
        f(&mut self.range);
    }
}

impl VisitRanges for ModuleVariable {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        self.name.visit_ranges(f);
        self.type_desc.visit_ranges(f);
        self.init.visit_ranges(f);
        f(&mut self.range);
    }
}

impl VisitRanges for FunctionDefinition {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        self.name.visit_ranges(f);
        self.accessor.visit_ranges(f);
        self.annotations.visit_ranges(f);
        self.params.visit_ranges(f);
        self.return_type.visit_ranges(f);
        match &mut self.body {
            FunctionBody::Block { statements } => statements.visit_ranges(f),
            FunctionBody::Expr { expr } => expr.visit_ranges(f),
            FunctionBody::External => {}
        }
        f(&mut self.range);
    }
}

impl VisitRanges for Param {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        self.name.visit_ranges(f);
        self.type_desc.visit_ranges(f);
        f(&mut self.range);
    }
}

impl VisitRanges for Stmt {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        match self {
            Stmt::Local {
                name,
                type_desc,
                init,
                range,
            } => {
                name.visit_ranges(f);
                type_desc.visit_ranges(f);
                init.visit_ranges(f);
                f(range);
            }
            Stmt::Assign {
                target,
                value,
                range,
            } => {
                target.visit_ranges(f);
                value.visit_ranges(f);
                f(range);
            }
            Stmt::Expr { expr } => expr.visit_ranges(f),
            Stmt::Return { value, range } => {
                value.visit_ranges(f);
                f(range);
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                range,
            } => {
                condition.visit_ranges(f);
                then_branch.visit_ranges(f);
                else_branch.visit_ranges(f);
                f(range);
            }
            Stmt::While {
                condition,
                body,
                range,
            } => {
                condition.visit_ranges(f);
                body.visit_ranges(f);
                f(range);
            }
            Stmt::Foreach {
                variable,
                collection,
                body,
                range,
            } => {
                variable.visit_ranges(f);
                collection.visit_ranges(f);
                body.visit_ranges(f);
                f(range);
            }
            Stmt::Block { body, range } => {
                body.visit_ranges(f);
                f(range);
            }
        }
    }
}

impl VisitRanges for Arg {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        self.value.visit_ranges(f);
    }
}

impl VisitRanges for Expr {
    fn visit_ranges(&mut self, f: &mut dyn FnMut(&mut RawRange)) {
        match self {
            Expr::Name { range, .. }
            | Expr::QualifiedName { range, .. }
            | Expr::Literal { range, .. }
            | Expr::Missing { range } => f(range),
            Expr::New {
                type_desc,
                args,
                range,
            } => {
                type_desc.visit_ranges(f);
                args.visit_ranges(f);
                f(range);
            }
            Expr::Call {
                callee,
                args,
                range,
            } => {
                callee.visit_ranges(f);
                args.visit_ranges(f);
                f(range);
            }
            Expr::RemoteCall {
                client,
                args,
                range,
                ..
            }
            | Expr::ResourceAccess {
                client,
                args,
                range,
                ..
            } => {
                client.visit_ranges(f);
                args.visit_ranges(f);
                f(range);
            }
            Expr::FieldAccess { target, range, .. } => {
                target.visit_ranges(f);
                f(range);
            }
            Expr::Check { expr, range } => {
                expr.visit_ranges(f);
                f(range);
            }
            Expr::Other { children, range } => {
                children.visit_ranges(f);
                f(range);
            }
        }
    }
}
