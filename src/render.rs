//! Renders a fully-simplified [`Node`] tree as Python-like source text:
//! an indent-tracking line writer, one method per statement kind.
//! Deliberately minimal — no line wrapping, no comment-preservation
//! beyond passing `Node::Comment`/`Node::Docstr` through verbatim, no
//! configurable style.
use crate::ir::{BinaryOp, Node, UnaryOp};
use crate::marshal::Value;

const INDENT: &str = "    ";

/// Renders `tree` as a complete, newline-terminated source listing.
pub fn render(tree: &Node) -> String {
    let mut gen = Generator { out: String::new() };
    gen.write_statement(tree, 0);
    gen.out
}

struct Generator {
    out: String,
}

impl Generator {
    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn write_statement(&mut self, node: &Node, depth: usize) {
        match node {
            Node::Block(stmts) => {
                if stmts.is_empty() {
                    self.line(depth, "pass");
                } else {
                    for stmt in stmts {
                        self.write_statement(stmt, depth);
                    }
                }
            }
            Node::Pass => self.line(depth, "pass"),
            Node::Docstr(text) => self.line(depth, &format!("{text:?}")),
            Node::Comment(text) => self.line(depth, &format!("# {text}")),
            Node::Global(names) => {
                let joined = names.iter().map(expr).collect::<Vec<_>>().join(", ");
                self.line(depth, &format!("global {joined}"));
            }
            Node::Print(items) => {
                let joined = items.iter().map(expr).collect::<Vec<_>>().join(", ");
                self.line(depth, &format!("print {joined}"));
            }
            Node::PrintNoNewline(items) => {
                let joined = items.iter().map(expr).collect::<Vec<_>>().join(", ");
                self.line(depth, &format!("print {joined},"));
            }
            Node::Del(target) => self.line(depth, &format!("del {}", expr(target))),
            Node::Return(value) => match value {
                Some(value) => self.line(depth, &format!("return {}", expr(value))),
                None => self.line(depth, "return"),
            },
            Node::Raise(value) => self.line(depth, &format!("raise {}", expr(value))),
            Node::Assign { left, right } => {
                self.line(depth, &format!("{} = {}", assign_side(left), assign_side(right)))
            }
            Node::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.line(depth, &format!("if {}:", expr(cond)));
                self.write_statement(then_branch, depth + 1);
                if let Some(else_branch) = else_branch {
                    self.line(depth, "else:");
                    self.write_statement(else_branch, depth + 1);
                }
            }
            Node::Else(body) => {
                self.line(depth, "else:");
                self.write_statement(body, depth + 1);
            }
            Node::Loop { cond, body } => {
                match cond {
                    Some(cond) => self.line(depth, &format!("while {}:", expr(cond))),
                    None => self.line(depth, "while True:"),
                }
                self.write_statement(body, depth + 1);
            }
            // An expression reached statement position (most commonly a
            // bare `Call`, e.g. a top-level function call with a discarded
            // result): rendered as an expression statement.
            other => self.line(depth, &expr(other)),
        }
    }
}

/// Renders one side of an `Assign`. A bare `Tuple` here is a parallel
/// assignment's target or source list (`a, b = c, d`), which Python prints
/// without the parens an ordinary tuple expression gets; anything else
/// renders exactly as [`expr`] would.
fn assign_side(node: &Node) -> String {
    match node {
        Node::Tuple(items) => items.iter().map(expr).collect::<Vec<_>>().join(", "),
        other => expr(other),
    }
}

/// Renders `node` as a single-line expression. Statement-only node kinds
/// (`If`, `Loop`, `Assign`, ...) never appear nested inside an expression
/// position in a well-formed tree; if one does, it's rendered via its
/// `{:?}` form so the bug is visible in the output rather than panicking.
fn expr(node: &Node) -> String {
    match node {
        Node::Ident(name) => name.clone(),
        Node::Const(value) => const_literal(value),
        Node::Tuple(items) => {
            let inner = items.iter().map(expr).collect::<Vec<_>>().join(", ");
            if items.len() == 1 {
                format!("({inner},)")
            } else {
                format!("({inner})")
            }
        }
        Node::List(items) => {
            let inner = items.iter().map(expr).collect::<Vec<_>>().join(", ");
            format!("[{inner}]")
        }
        Node::Dict(items) => {
            let inner = items.iter().map(expr).collect::<Vec<_>>().join(", ");
            format!("{{{inner}}}")
        }
        Node::DictItem { key, value } => format!("{}: {}", expr(key), expr(value)),
        Node::Unary { op, child } => format!("{}{}", unary_symbol(*op), paren(child)),
        Node::Binary {
            op: BinaryOp::Subscript,
            left,
            right,
        } => format!("{}[{}]", paren(left), expr(right)),
        Node::Binary { op, left, right } => {
            format!("{} {} {}", paren(left), binary_symbol(*op), paren(right))
        }
        Node::Slice {
            target,
            lower,
            upper,
        } => {
            let lower = lower.as_ref().map(|n| expr(n)).unwrap_or_default();
            let upper = upper.as_ref().map(|n| expr(n)).unwrap_or_default();
            format!("{}[{lower}:{upper}]", paren(target))
        }
        Node::SliceRange { start, stop, step } => {
            format!("slice({}, {}, {})", expr(start), expr(stop), expr(step))
        }
        Node::Call { func, args, kwargs } => {
            let mut parts = match args.as_ref() {
                Node::Tuple(items) => items.iter().map(expr).collect::<Vec<_>>(),
                other => vec![expr(other)],
            };
            if let Node::Dict(items) = kwargs.as_ref() {
                for item in items {
                    if let Node::DictItem { key, value } = item {
                        parts.push(format!("{}={}", key_as_name(key), expr(value)));
                    }
                }
            }
            format!("{}({})", expr(func), parts.join(", "))
        }
        Node::Attr { base, name } => format!("{}.{}", paren(base), key_as_name(name)),
        Node::Opcode { op, arg, .. } => match arg {
            Some(arg) => format!("<{op} {}>", expr(arg)),
            None => format!("<{op}>"),
        },
        Node::Pass => "pass".to_string(),
        Node::Comment(text) => format!("# {text}"),
        Node::Docstr(text) => format!("{text:?}"),
        other => format!("{other:?}"),
    }
}

/// Wraps an operand expression in parentheses when it's itself a binary or
/// unary expression, so precedence isn't silently lost; this is
/// deliberately conservative (over-parenthesizing) rather than trying to
/// reproduce Python's exact precedence table.
fn paren(node: &Node) -> String {
    match node {
        Node::Binary { .. } | Node::Unary { .. } => format!("({})", expr(node)),
        other => expr(other),
    }
}

fn key_as_name(node: &Node) -> String {
    match node {
        Node::Const(Value::Str(s)) => s.clone(),
        other => expr(other),
    }
}

fn const_literal(value: &Value) -> String {
    match value {
        Value::None => "None".to_string(),
        Value::True => "True".to_string(),
        Value::False => "False".to_string(),
        Value::StopIteration => "StopIteration".to_string(),
        Value::Ellipsis => "...".to_string(),
        Value::Null => "None".to_string(),
        Value::Int(n) => n.to_string(),
        Value::BigInt(n) => n.to_string(),
        Value::Float(f) => format!("{f}"),
        Value::Complex(re, im) => format!("complex({re}, {im})"),
        Value::Bytes(bytes) => format!("{bytes:?}"),
        Value::Str(s) => format!("{s:?}"),
        Value::Tuple(items) => {
            let inner = items.iter().map(const_literal).collect::<Vec<_>>().join(", ");
            if items.len() == 1 {
                format!("({inner},)")
            } else {
                format!("({inner})")
            }
        }
        Value::List(items) => {
            let inner = items.iter().map(const_literal).collect::<Vec<_>>().join(", ");
            format!("[{inner}]")
        }
        Value::Set(items) => {
            let inner = items.iter().map(const_literal).collect::<Vec<_>>().join(", ");
            format!("set([{inner}])")
        }
        Value::FrozenSet(items) => {
            let inner = items.iter().map(const_literal).collect::<Vec<_>>().join(", ");
            format!("frozenset([{inner}])")
        }
        Value::Dict(items) => {
            let inner = items
                .iter()
                .map(|(k, v)| format!("{}: {}", const_literal(k), const_literal(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{inner}}}")
        }
        Value::Code(code) => format!("<code {}>", code.name),
    }
}

fn unary_symbol(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Plus => "+",
        UnaryOp::Minus => "-",
        UnaryOp::Invert => "~",
        UnaryOp::Not => "not ",
        UnaryOp::Repr => "`",
    }
}

fn binary_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Mod => "%",
        BinaryOp::Pow => "**",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Is => "is",
        BinaryOp::IsNot => "is not",
        BinaryOp::In => "in",
        BinaryOp::NotIn => "not in",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::Subscript => unreachable!("Subscript is rendered specially in expr()"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Node {
        Node::Ident(name.to_string())
    }

    #[test]
    fn simple_assign_renders_as_one_line() {
        let tree = Node::Block(vec![Node::Assign {
            left: Box::new(ident("a")),
            right: Box::new(Node::Const(Value::Int(1))),
        }]);
        assert_eq!(render(&tree), "a = 1\n");
    }

    #[test]
    fn if_else_renders_with_nested_indentation() {
        let tree = Node::Block(vec![Node::If {
            cond: Box::new(ident("x")),
            then_branch: Box::new(Node::Block(vec![Node::Return(Some(Box::new(Node::Const(
                Value::Int(1),
            ))))])),
            else_branch: Some(Box::new(Node::Block(vec![Node::Return(Some(Box::new(
                Node::Const(Value::Int(2)),
            )))]))),
        }]);
        let out = render(&tree);
        assert_eq!(out, "if x:\n    return 1\nelse:\n    return 2\n");
    }

    #[test]
    fn dict_literal_renders_with_colon_separated_items() {
        let tree = Node::Dict(vec![Node::DictItem {
            key: Box::new(Node::Const(Value::Int(1))),
            value: Box::new(Node::Const(Value::Int(2))),
        }]);
        assert_eq!(expr(&tree), "{1: 2}");
    }

    #[test]
    fn binary_add_is_parenthesized_when_nested() {
        let inner = Node::Binary {
            op: BinaryOp::Add,
            left: Box::new(ident("a")),
            right: Box::new(ident("b")),
        };
        let outer = Node::Binary {
            op: BinaryOp::Mul,
            left: Box::new(inner),
            right: Box::new(ident("c")),
        };
        assert_eq!(expr(&outer), "(a + b) * c");
    }

    #[test]
    fn empty_block_renders_as_pass() {
        assert_eq!(render(&Node::Block(vec![])), "pass\n");
    }
}
