//! Formula Abstract Syntax Tree types

use std::fmt;

/// Formula expression AST
///
/// Leaves are numeric literals or field references; interior nodes are the
/// four arithmetic operators and unary negation. Nothing else can be
/// expressed, so evaluating a tree never runs anything but arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    /// Numeric literal
    Number(f64),
    /// Reference to a named field
    Field(FieldRef),
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },
}

/// Field reference with its location in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub name: String,
    /// Character offset of the first character of the name
    pub position: usize,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    /// Binding strength; higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => 1,
            BinaryOperator::Multiply | BinaryOperator::Divide => 2,
        }
    }

    /// Source symbol
    pub fn symbol(self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
        }
    }

    /// Apply the operator with IEEE 754 semantics
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOperator::Add => left + right,
            BinaryOperator::Subtract => left - right,
            BinaryOperator::Multiply => left * right,
            BinaryOperator::Divide => left / right,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
}

impl FormulaExpr {
    /// Distinct field names in order of first appearance
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        self.visit_fields(&mut |field| {
            if !names.iter().any(|name| *name == field.name) {
                names.push(field.name.clone());
            }
        });
        names
    }

    /// Call `f` for every field reference, left to right
    pub fn visit_fields<F: FnMut(&FieldRef)>(&self, f: &mut F) {
        match self {
            FormulaExpr::Number(_) => {}
            FormulaExpr::Field(field) => f(field),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.visit_fields(f);
                right.visit_fields(f);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.visit_fields(f),
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            FormulaExpr::BinaryOp { op, .. } => op.precedence(),
            FormulaExpr::UnaryOp { .. } => 3,
            FormulaExpr::Number(n) if n.is_sign_negative() => 3,
            FormulaExpr::Number(_) | FormulaExpr::Field(_) => 4,
        }
    }
}

/// Canonical rendering with single spaces around binary operators and only
/// the parentheses the tree shape requires.
impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaExpr::Number(n) => write!(f, "{n}"),
            FormulaExpr::Field(field) => f.write_str(&field.name),
            FormulaExpr::BinaryOp { op, left, right } => {
                let prec = op.precedence();
                write_operand(f, left, left.precedence() < prec)?;
                write!(f, " {} ", op.symbol())?;
                // Left-associative: an equal-precedence right operand keeps its parentheses
                write_operand(f, right, right.precedence() <= prec)
            }
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand,
            } => {
                f.write_str("-")?;
                write_operand(f, operand, operand.precedence() < 3)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &FormulaExpr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(name: &str) -> FormulaExpr {
        FormulaExpr::Field(FieldRef {
            name: name.into(),
            position: 0,
        })
    }

    fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> FormulaExpr {
        FormulaExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_display_minimal_parens() {
        // (results * 15) / spend
        let expr = binary(
            BinaryOperator::Divide,
            binary(BinaryOperator::Multiply, field("results"), FormulaExpr::Number(15.0)),
            field("spend"),
        );
        assert_eq!(expr.to_string(), "results * 15 / spend");

        // results * (15 / spend)
        let expr = binary(
            BinaryOperator::Multiply,
            field("results"),
            binary(BinaryOperator::Divide, FormulaExpr::Number(15.0), field("spend")),
        );
        assert_eq!(expr.to_string(), "results * (15 / spend)");

        // -(a + b) * 0.5
        let expr = binary(
            BinaryOperator::Multiply,
            FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(binary(BinaryOperator::Add, field("a"), field("b"))),
            },
            FormulaExpr::Number(0.5),
        );
        assert_eq!(expr.to_string(), "-(a + b) * 0.5");
    }

    #[test]
    fn test_referenced_fields_dedup_in_order() {
        let expr = binary(
            BinaryOperator::Add,
            binary(BinaryOperator::Divide, field("results"), field("spend")),
            binary(BinaryOperator::Multiply, field("spend"), field("clicks")),
        );
        assert_eq!(expr.referenced_fields(), vec!["results", "spend", "clicks"]);
        assert!(FormulaExpr::Number(1.0).referenced_fields().is_empty());
    }

    #[test]
    fn test_apply_follows_ieee() {
        assert_eq!(BinaryOperator::Divide.apply(1.0, 0.0), f64::INFINITY);
        assert_eq!(BinaryOperator::Divide.apply(-1.0, 0.0), f64::NEG_INFINITY);
        assert!(BinaryOperator::Divide.apply(0.0, 0.0).is_nan());
    }
}
