//! Arithmetic Evaluation
//!
//! Default integer evaluator for `$((...))`, substring offsets and nested
//! arithmetic. Evaluates while parsing:
//! - Basic operators (+, -, *, /, %, **)
//! - Comparison operators (<, <=, >, >=, ==, !=)
//! - Bitwise operators (&, |, ^, ~, <<, >>)
//! - Logical operators (&&, ||, !) with short-circuiting
//! - Ternary operator (? :) and the comma operator
//! - Assignment (=, +=, -=, *=, /=, %=, <<=, >>=, &=, |=, ^=) and ++/--
//! - Decimal, octal (leading 0), hex (0x) and base#digits literals
//!
//! Bare variable names resolve through the expansion context. A value that
//! is itself an expression is evaluated recursively, up to a fixed depth.
//! Assignments inside a short-circuited branch are not performed.

use crate::interpreter::errors::ArithmeticError;
use crate::interpreter::runtime::ArithmeticEvaluator;
use crate::interpreter::types::ExpansionContext;

/// Limit for variables whose values are expressions naming other variables.
const MAX_RECURSION_DEPTH: usize = 16;

/// Binary operators by precedence, loosest first.
const BINARY_LEVELS: &[&[&str]] = &[
    &["||"],
    &["&&"],
    &["|"],
    &["^"],
    &["&"],
    &["==", "!="],
    &["<", "<=", ">", ">="],
    &["<<", ">>"],
    &["+", "-"],
    &["*", "/", "%"],
];

/// Assignment operators; the binary operator applied is the text before `=`.
const ASSIGNMENT_OPS: &[&str] = &["=", "+=", "-=", "*=", "/=", "%=", "<<=", ">>=", "&=", "|=", "^="];

/// Operators, longest first so that `**` wins over `*`.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "**", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "++", "--", "+=", "-=",
    "*=", "/=", "%=", "&=", "|=", "^=", "+", "-", "*", "/", "%", "<", ">", "&", "|", "^", "!", "~",
    "?", ":", ",", "(", ")", "=",
];

/// 64-bit integer arithmetic with C precedence.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerArithmetic;

impl ArithmeticEvaluator for IntegerArithmetic {
    fn evaluate(&self, expression: &str, ctx: &mut ExpansionContext) -> Result<i64, ArithmeticError> {
        evaluate_expression(expression, ctx, 0)
    }
}

fn evaluate_expression(
    expression: &str,
    ctx: &mut ExpansionContext,
    depth: usize,
) -> Result<i64, ArithmeticError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Ok(0);
    }
    let mut parser = ArithParser {
        input: expression,
        tokens,
        pos: 0,
        ctx,
        depth,
        skip: 0,
    };
    let value = parser.comma()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.syntax_error("syntax error in expression"));
    }
    Ok(value)
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Number(i64),
    Ident(String),
    Op(&'static str),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    /// Byte offset in the expression, for error messages
    offset: usize,
}

fn tokenize(input: &str) -> Result<Vec<Token>, ArithmeticError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(c) = rest.chars().next() else {
            break;
        };

        if rest.starts_with("\\\n") {
            pos += 2;
            continue;
        }
        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        if c.is_ascii_digit() {
            let len = rest
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '#' || ch == '@' || ch == '_'))
                .unwrap_or(rest.len());
            let literal = &rest[..len];
            let value = parse_arith_number(literal).ok_or_else(|| {
                ArithmeticError::new(format!(
                    "value too great for base (error token is \"{}\")",
                    literal
                ))
            })?;
            tokens.push(Token { kind: TokenKind::Number(value), offset: pos });
            pos += len;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let len = rest
                .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_'))
                .unwrap_or(rest.len());
            tokens.push(Token { kind: TokenKind::Ident(rest[..len].to_string()), offset: pos });
            pos += len;
            continue;
        }

        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            // `++`/`--` only next to a variable; otherwise `1++2` is `1 + +2`
            Some(op) if (*op == "++" || *op == "--") && !touches_variable(&tokens, &rest[2..]) => {
                let sign: &'static str = if *op == "++" { "+" } else { "-" };
                tokens.push(Token { kind: TokenKind::Op(sign), offset: pos });
                pos += 1;
            }
            Some(op) => {
                tokens.push(Token { kind: TokenKind::Op(op), offset: pos });
                pos += op.len();
            }
            None => {
                return Err(ArithmeticError::new(format!(
                    "syntax error: invalid arithmetic operator (error token is \"{}\")",
                    rest.trim()
                )));
            }
        }
    }

    Ok(tokens)
}

/// Whether an increment at this point follows or precedes a variable name.
fn touches_variable(tokens: &[Token], after: &str) -> bool {
    if matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Ident(_))) {
        return true;
    }
    after
        .trim_start()
        .starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
}

/// Parse a number string with various bases (decimal, hex, octal, base#num)
/// Returns None for invalid numbers.
pub fn parse_arith_number(s: &str) -> Option<i64> {
    // Bases 2-64, digits: 0-9, a-z (10-35), A-Z (36-61), @ (62), _ (63)
    if let Some((base, digits)) = s.split_once('#') {
        let base: u32 = base.parse().ok()?;
        if !(2..=64).contains(&base) || digits.is_empty() {
            return None;
        }
        let mut result: i64 = 0;
        for ch in digits.chars() {
            let digit_value = match ch {
                '0'..='9' => ch as i64 - '0' as i64,
                'a'..='z' if base <= 36 => ch as i64 - 'a' as i64 + 10,
                'A'..='Z' if base <= 36 => ch as i64 - 'A' as i64 + 10,
                'a'..='z' => ch as i64 - 'a' as i64 + 10,
                'A'..='Z' => ch as i64 - 'A' as i64 + 36,
                '@' => 62,
                '_' => 63,
                _ => return None,
            };
            if digit_value >= base as i64 {
                return None;
            }
            result = result.wrapping_mul(base as i64).wrapping_add(digit_value);
        }
        return Some(result);
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }

    if s.len() > 1 && s.starts_with('0') {
        return i64::from_str_radix(s, 8).ok();
    }

    if !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

// ============================================================================
// Parser
// ============================================================================

struct ArithParser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    ctx: &'a mut ExpansionContext,
    depth: usize,
    /// Non-zero while parsing a branch that short-circuiting discards
    skip: usize,
}

impl ArithParser<'_> {
    fn peek_op(&self, candidates: &[&'static str]) -> Option<&'static str> {
        match self.tokens.get(self.pos).map(|t| &t.kind) {
            Some(TokenKind::Op(op)) if candidates.contains(op) => Some(op),
            _ => None,
        }
    }

    fn expect_op(&mut self, op: &'static str) -> Result<(), ArithmeticError> {
        if self.peek_op(&[op]).is_some() {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.syntax_error(&format!("syntax error: `{}' expected", op)))
        }
    }

    fn syntax_error(&self, message: &str) -> ArithmeticError {
        let token = self
            .tokens
            .get(self.pos)
            .map(|t| self.input[t.offset..].trim())
            .unwrap_or("");
        ArithmeticError::new(format!("{} (error token is \"{}\")", message, token))
    }

    /// expr (',' expr)*
    fn comma(&mut self) -> Result<i64, ArithmeticError> {
        let mut value = self.assignment()?;
        while self.peek_op(&[","]).is_some() {
            self.pos += 1;
            value = self.assignment()?;
        }
        Ok(value)
    }

    /// name op= expr, right-associative
    fn assignment(&mut self) -> Result<i64, ArithmeticError> {
        let target = match (self.tokens.get(self.pos), self.tokens.get(self.pos + 1)) {
            (Some(Token { kind: TokenKind::Ident(name), .. }), Some(Token { kind: TokenKind::Op(op), .. }))
                if ASSIGNMENT_OPS.contains(op) =>
            {
                Some((name.clone(), *op))
            }
            _ => None,
        };
        let Some((name, op)) = target else {
            return self.ternary();
        };
        self.pos += 2;

        let value = self.assignment()?;
        if self.skip > 0 {
            return Ok(value);
        }
        let new_value = match &op[..op.len() - 1] {
            "" => value,
            binary => {
                let current = self.resolve_variable(&name)?;
                self.apply_binary_op(current, value, binary)?
            }
        };
        self.assign(&name, new_value);
        Ok(new_value)
    }

    fn assign(&mut self, name: &str, value: i64) {
        if self.skip == 0 {
            self.ctx.define_variable(name, value.to_string());
        }
    }

    /// Apply `++`/`--` to a variable, returning the old and new values.
    fn step_variable(&mut self, name: &str, op: &str) -> Result<(i64, i64), ArithmeticError> {
        if self.skip > 0 {
            return Ok((0, 0));
        }
        let current = self.resolve_variable(name)?;
        let new_value = if op == "++" {
            current.wrapping_add(1)
        } else {
            current.wrapping_sub(1)
        };
        self.assign(name, new_value);
        Ok((current, new_value))
    }

    /// cond ? a : b
    fn ternary(&mut self) -> Result<i64, ArithmeticError> {
        let condition = self.binary(0)?;
        if self.peek_op(&["?"]).is_none() {
            return Ok(condition);
        }
        self.pos += 1;

        let taken = condition != 0;
        let consequent = self.branch(!taken, Self::assignment)?;
        self.expect_op(":")?;
        let alternate = self.branch(taken, Self::ternary)?;
        Ok(if taken { consequent } else { alternate })
    }

    /// Parse with evaluation errors suppressed when `discard` is set.
    fn branch(
        &mut self,
        discard: bool,
        parse: fn(&mut Self) -> Result<i64, ArithmeticError>,
    ) -> Result<i64, ArithmeticError> {
        if discard {
            self.skip += 1;
        }
        let result = parse(self);
        if discard {
            self.skip -= 1;
        }
        result
    }

    fn binary(&mut self, level: usize) -> Result<i64, ArithmeticError> {
        if level == BINARY_LEVELS.len() {
            return self.power();
        }
        let mut left = self.binary(level + 1)?;
        while let Some(op) = self.peek_op(BINARY_LEVELS[level]) {
            self.pos += 1;
            let short_circuit = match op {
                "&&" => left == 0,
                "||" => left != 0,
                _ => false,
            };
            if short_circuit {
                self.skip += 1;
            }
            let right = self.binary(level + 1);
            if short_circuit {
                self.skip -= 1;
            }
            left = self.apply_binary_op(left, right?, op)?;
        }
        Ok(left)
    }

    /// Right-associative `**`, binding looser than unary operators.
    fn power(&mut self) -> Result<i64, ArithmeticError> {
        let base = self.unary()?;
        if self.peek_op(&["**"]).is_some() {
            self.pos += 1;
            let exponent = self.power()?;
            return self.apply_binary_op(base, exponent, "**");
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<i64, ArithmeticError> {
        if let Some(op) = self.peek_op(&["++", "--"]) {
            self.pos += 1;
            let Some(TokenKind::Ident(name)) = self.tokens.get(self.pos).map(|t| t.kind.clone()) else {
                return Err(self.syntax_error("syntax error: operand expected"));
            };
            self.pos += 1;
            return Ok(self.step_variable(&name, op)?.1);
        }
        match self.peek_op(&["+", "-", "!", "~"]) {
            Some(op) => {
                self.pos += 1;
                let operand = self.unary()?;
                Ok(match op {
                    "-" => operand.wrapping_neg(),
                    "!" => (operand == 0) as i64,
                    "~" => !operand,
                    _ => operand,
                })
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<i64, ArithmeticError> {
        let Some(token) = self.tokens.get(self.pos) else {
            return Err(ArithmeticError::new("syntax error: operand expected"));
        };
        match token.kind.clone() {
            TokenKind::Number(n) => {
                self.pos += 1;
                Ok(n)
            }
            TokenKind::Ident(name) => {
                self.pos += 1;
                if let Some(op) = self.peek_op(&["++", "--"]) {
                    self.pos += 1;
                    return Ok(self.step_variable(&name, op)?.0);
                }
                if self.skip > 0 {
                    return Ok(0);
                }
                self.resolve_variable(&name)
            }
            TokenKind::Op("(") => {
                self.pos += 1;
                let value = self.comma()?;
                self.expect_op(")")?;
                Ok(value)
            }
            TokenKind::Op(_) => Err(self.syntax_error("syntax error: operand expected")),
        }
    }

    /// Recursively resolve a variable name to its numeric value.
    ///   foo=5; bar=foo; $((bar)) => 5
    ///   e=1+2; $((e + 3)) => 6
    fn resolve_variable(&mut self, name: &str) -> Result<i64, ArithmeticError> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(ArithmeticError::new(format!(
                "expression recursion level exceeded (error token is \"{}\")",
                name
            )));
        }
        let value = self.ctx.lookup(name).unwrap_or_default();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(0);
        }
        if let Some(n) = parse_arith_number(trimmed) {
            return Ok(n);
        }
        evaluate_expression(trimmed, &mut *self.ctx, self.depth + 1)
    }

    /// Pure binary operator evaluation. Errors are suppressed inside a
    /// discarded branch.
    fn apply_binary_op(&self, left: i64, right: i64, op: &str) -> Result<i64, ArithmeticError> {
        let fail = |message: &str| {
            if self.skip > 0 {
                Ok(0)
            } else {
                Err(ArithmeticError::new(message))
            }
        };
        Ok(match op {
            "+" => left.wrapping_add(right),
            "-" => left.wrapping_sub(right),
            "*" => left.wrapping_mul(right),
            "/" if right == 0 => return fail("division by 0"),
            "/" => left.wrapping_div(right),
            "%" if right == 0 => return fail("division by 0"),
            "%" => left.wrapping_rem(right),
            "**" if right < 0 => return fail("exponent less than 0"),
            "**" => left.wrapping_pow(u32::try_from(right).unwrap_or(u32::MAX)),
            "<<" => left.wrapping_shl((right & 63) as u32),
            ">>" => left.wrapping_shr((right & 63) as u32),
            "<" => (left < right) as i64,
            "<=" => (left <= right) as i64,
            ">" => (left > right) as i64,
            ">=" => (left >= right) as i64,
            "==" => (left == right) as i64,
            "!=" => (left != right) as i64,
            "&" => left & right,
            "|" => left | right,
            "^" => left ^ right,
            "&&" => (left != 0 && right != 0) as i64,
            "||" => (left != 0 || right != 0) as i64,
            _ => return fail("syntax error: invalid arithmetic operator"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> Result<i64, ArithmeticError> {
        IntegerArithmetic.evaluate(expr, &mut ExpansionContext::new())
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9);
        assert_eq!(eval("2 ** 3 ** 2").unwrap(), 512);
        assert_eq!(eval("-2 ** 2").unwrap(), 4);
        assert_eq!(eval("1 << 4 | 1").unwrap(), 17);
        assert_eq!(eval("7 % 3 == 1 && 2 > 1").unwrap(), 1);
        assert_eq!(eval("!0 + ~0").unwrap(), 0);
    }

    #[test]
    fn test_ternary_and_comma() {
        assert_eq!(eval("1 ? 10 : 20").unwrap(), 10);
        assert_eq!(eval("0 ? 10 : 1 ? 30 : 40").unwrap(), 30);
        assert_eq!(eval("1, 2, 3").unwrap(), 3);
    }

    #[test]
    fn test_number_bases() {
        assert_eq!(eval("010").unwrap(), 8);
        assert_eq!(eval("0x1F").unwrap(), 31);
        assert_eq!(eval("2#101").unwrap(), 5);
        assert_eq!(eval("16#ff").unwrap(), 255);
        assert_eq!(eval("64#_").unwrap(), 63);
        assert!(eval("09").is_err());
    }

    #[test]
    fn test_empty_expression_is_zero() {
        assert_eq!(eval("").unwrap(), 0);
        assert_eq!(eval("   ").unwrap(), 0);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("1 / 0").unwrap_err().message, "division by 0");
        assert!(eval("5 % 0").is_err());
        // Discarded branches do not fail
        assert_eq!(eval("0 && 1 / 0").unwrap(), 0);
        assert_eq!(eval("1 || 1 / 0").unwrap(), 1);
        assert_eq!(eval("1 ? 2 : 1 / 0").unwrap(), 2);
    }

    #[test]
    fn test_syntax_errors() {
        assert!(eval("1 +").is_err());
        assert!(eval("(1 + 2").is_err());
        assert!(eval("1 2").is_err());
        assert!(eval("1 $ 2").is_err());
        assert!(eval("2 ** -1").is_err());
    }

    #[test]
    fn test_variables_resolve_recursively() {
        let mut ctx = ExpansionContext::new();
        ctx.define_variable("foo", "5");
        ctx.define_variable("bar", "foo");
        ctx.define_variable("e", "1+2");
        ctx.define_variable("blank", "");
        assert_eq!(IntegerArithmetic.evaluate("bar * 2", &mut ctx).unwrap(), 10);
        assert_eq!(IntegerArithmetic.evaluate("e + 3", &mut ctx).unwrap(), 6);
        assert_eq!(IntegerArithmetic.evaluate("missing + blank", &mut ctx).unwrap(), 0);
    }

    #[test]
    fn test_self_reference_hits_depth_limit() {
        let mut ctx = ExpansionContext::new();
        ctx.define_variable("loop", "loop + 1");
        let err = IntegerArithmetic.evaluate("loop", &mut ctx).unwrap_err();
        assert!(err.message.contains("recursion level exceeded"));
    }

    #[test]
    fn test_assignment_writes_variables() {
        let mut ctx = ExpansionContext::new();
        assert_eq!(IntegerArithmetic.evaluate("x = 5", &mut ctx).unwrap(), 5);
        assert_eq!(ctx.get_variable("x"), Some("5"));
        assert_eq!(IntegerArithmetic.evaluate("x += 2, x *= 3", &mut ctx).unwrap(), 21);
        assert_eq!(IntegerArithmetic.evaluate("a = b = 4", &mut ctx).unwrap(), 4);
        assert_eq!(ctx.get_variable("a"), Some("4"));
        assert_eq!(ctx.get_variable("b"), Some("4"));
        assert_eq!(IntegerArithmetic.evaluate("x <<= 1", &mut ctx).unwrap(), 42);
        assert!(IntegerArithmetic.evaluate("x /= 0", &mut ctx).is_err());
        assert_eq!(ctx.get_variable("x"), Some("42"));
        assert!(IntegerArithmetic.evaluate("1 = 2", &mut ctx).is_err());
    }

    #[test]
    fn test_increment_and_decrement() {
        let mut ctx = ExpansionContext::new();
        ctx.define_variable("i", "1");
        assert_eq!(IntegerArithmetic.evaluate("i++", &mut ctx).unwrap(), 1);
        assert_eq!(ctx.get_variable("i"), Some("2"));
        assert_eq!(IntegerArithmetic.evaluate("++i", &mut ctx).unwrap(), 3);
        assert_eq!(IntegerArithmetic.evaluate("i--", &mut ctx).unwrap(), 3);
        assert_eq!(IntegerArithmetic.evaluate("--i", &mut ctx).unwrap(), 1);
        assert_eq!(ctx.get_variable("i"), Some("1"));
        // Not next to a variable, the signs are unary operators
        assert_eq!(IntegerArithmetic.evaluate("1++2", &mut ctx).unwrap(), 3);
        assert_eq!(IntegerArithmetic.evaluate("--1", &mut ctx).unwrap(), 1);
    }

    #[test]
    fn test_discarded_branch_does_not_assign() {
        let mut ctx = ExpansionContext::new();
        assert_eq!(IntegerArithmetic.evaluate("0 && (x = 1)", &mut ctx).unwrap(), 0);
        assert_eq!(IntegerArithmetic.evaluate("1 || y++", &mut ctx).unwrap(), 1);
        assert_eq!(IntegerArithmetic.evaluate("1 ? (z = 2) : (w = 3)", &mut ctx).unwrap(), 2);
        assert_eq!(ctx.get_variable("x"), None);
        assert_eq!(ctx.get_variable("y"), None);
        assert_eq!(ctx.get_variable("z"), Some("2"));
        assert_eq!(ctx.get_variable("w"), None);
    }
}
