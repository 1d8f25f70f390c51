use crate::ast::{Expr, FunctionDecl, Stmt};
use crate::token::LiteralValue;

/// Renders the tree in Crafting‑Interpreters style prefix form, e.g.
/// `(* (- 123.0) (group 45.67))`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::Bool(b) => b.to_string(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── bindings ────────────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            // ── calls and properties ────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(= {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} = {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => {
                let mut s = String::from("(block");
                Self::push_all(&mut s, statements);
                s.push(')');
                s
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if-else {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Function(function) => Self::print_function("fun", function),

            Stmt::Return { value, .. } => match value {
                Some(value) => format!("(return {})", Self::print(value)),
                None => "(return)".into(),
            },

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut s = format!("(class {}", name.lexeme);
                if let Some(superclass) = superclass {
                    s.push_str(" < ");
                    s.push_str(&Self::print(superclass));
                }
                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::print_function("method", method));
                }
                s.push(')');
                s
            }
        }
    }

    /// One line per top‑level statement.
    pub fn print_program(statements: &[Stmt]) -> String {
        statements
            .iter()
            .map(Self::print_stmt)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn print_function(keyword: &str, function: &FunctionDecl) -> String {
        let params: Vec<&str> = function.params.iter().map(|p| p.lexeme.as_str()).collect();

        let mut s = format!("({} {}({})", keyword, function.name.lexeme, params.join(" "));
        Self::push_all(&mut s, &function.body);
        s.push(')');
        s
    }

    fn push_all(s: &mut String, statements: &[Stmt]) {
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenType};

    #[test]
    fn prints_nested_prefix_form() {
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: Token::new(TokenType::MINUS, "-", 1),
                right: Box::new(Expr::Literal(LiteralValue::Number(123.0))),
            }),
            operator: Token::new(TokenType::STAR, "*", 1),
            right: Box::new(Expr::Grouping(Box::new(Expr::Literal(
                LiteralValue::Number(45.67),
            )))),
        };

        assert_eq!(AstPrinter::print(&expr), "(* (- 123.0) (group 45.67))");
    }
}
