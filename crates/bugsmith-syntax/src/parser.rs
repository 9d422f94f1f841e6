//! Python parser
//!
//! Parses with tree-sitter, then lowers the concrete syntax tree into the
//! closed [`Stmt`]/[`Expr`] variant set. Any `ERROR` or `MISSING` node fails
//! the whole parse; nothing is lowered from a broken tree.

use tree_sitter::Node;

use crate::ast::{
    Alias, Arg, BinOp, BoolOp, ClassDef, CmpOp, CompKind, Comprehension, DictItem, ExceptHandler,
    Expr, For, FunctionDef, IntLiteral, MatchCase, Module, Param, Segment, Stmt, Try, UnaryOp,
    With, WithItem,
};
use crate::error::{ParseError, Position};

/// Default limit on syntactic nesting (statements and expressions)
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Operators of a flat `a + b + c` chain that add up to one nesting level
pub const CHAIN_LINKS_PER_LEVEL: usize = 4;

/// Source text → syntax tree
pub trait SourceParser: Send + Sync {
    /// Parse a complete module
    ///
    /// # Errors
    /// Returns [`ParseError`] if the text is not valid, supported Python
    fn parse(&self, text: &str) -> Result<Module, ParseError>;

    /// Check that `text` is syntactically valid without building a tree
    ///
    /// # Errors
    /// Returns [`ParseError`] describing the first problem found
    fn check(&self, text: &str) -> Result<(), ParseError> {
        self.parse(text).map(|_| ())
    }
}

/// tree-sitter backed Python 3 parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PythonParser {
    max_depth: usize,
}

impl Default for PythonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PythonParser {
    /// Create parser with the default nesting limit
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// With nesting depth limit
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Get nesting depth limit
    #[inline]
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl PythonParser {
    fn concrete_tree(text: &str) -> Result<tree_sitter::Tree, ParseError> {
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ParseError::ParserInit(e.to_string()))?;

        let tree = parser.parse(text, None).ok_or(ParseError::ParseFailed)?;
        let root = tree.root_node();
        if root.has_error() {
            return Err(describe_error(root, text));
        }
        Ok(tree)
    }
}

impl SourceParser for PythonParser {
    fn check(&self, text: &str) -> Result<(), ParseError> {
        Self::concrete_tree(text).map(|_| ())
    }

    fn parse(&self, text: &str) -> Result<Module, ParseError> {
        let tree = Self::concrete_tree(text)?;
        let root = tree.root_node();

        let mut lowering = Lowering {
            source: text,
            depth: 0,
            max_depth: self.max_depth,
        };
        Ok(Module::new(lowering.block(root)?))
    }
}

/// Build a syntax error for the first broken node in document order
fn describe_error(root: Node<'_>, source: &str) -> ParseError {
    let Some(node) = first_error(root) else {
        return ParseError::syntax("invalid syntax", position(root));
    };

    let message = if node.is_missing() {
        format!("missing `{}`", node.kind())
    } else {
        let snippet: String = source
            .get(node.byte_range())
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .chars()
            .take(24)
            .collect();
        if snippet.is_empty() {
            "unexpected end of input".to_string()
        } else {
            format!("unexpected `{}`", snippet)
        }
    };

    ParseError::syntax(message, position(node))
}

fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = root.walk();
    loop {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        // only descend into subtrees that contain an error
        if node.has_error() && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

#[inline]
fn position(node: Node<'_>) -> Position {
    node.start_position().into()
}

/// Named children, skipping comments and line continuations
fn named(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !c.is_extra())
        .collect()
}

/// All children (named and anonymous tokens), skipping extras
fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).filter(|c| !c.is_extra()).collect()
}

fn field_all<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

fn required<'t>(node: Node<'t>, field: &str) -> Result<Node<'t>, ParseError> {
    node.child_by_field_name(field).ok_or_else(|| {
        ParseError::syntax(
            format!("`{}` without {}", node.kind(), field),
            position(node),
        )
    })
}

fn first_named(node: Node<'_>) -> Result<Node<'_>, ParseError> {
    named(node)
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::syntax(format!("empty `{}`", node.kind()), position(node)))
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    children(node)
        .iter()
        .any(|c| !c.is_named() && c.kind() == token)
}

fn is_async(node: Node<'_>) -> bool {
    children(node).first().is_some_and(|c| c.kind() == "async")
}

fn unsupported(node: Node<'_>) -> ParseError {
    ParseError::unsupported(node.kind().replace('_', " "), position(node))
}

/// Expressions interpolated into a string literal, in source order
///
/// Includes the ones nested in format specifiers (`f"{x:>{width}}"`).
fn interpolations(string: Node<'_>) -> Vec<Node<'_>> {
    let mut found = Vec::new();
    let mut pending = vec![string];
    while let Some(node) = pending.pop() {
        for child in named(node) {
            if matches!(child.kind(), "interpolation" | "format_expression") {
                found.extend(child.child_by_field_name("expression"));
                pending.extend(
                    named(child)
                        .into_iter()
                        .filter(|c| c.kind() == "format_specifier"),
                );
            }
        }
    }
    found.sort_by_key(Node::start_byte);
    found
}

/// Names a `case` pattern reads: dotted value patterns and class names
///
/// A bare name is a capture and stays part of the pattern text.
fn pattern_references<'t>(patterns: &[Node<'t>]) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    let mut pending = patterns.to_vec();
    while let Some(node) = pending.pop() {
        match node.kind() {
            "dotted_name" => {
                if named(node).len() > 1 {
                    found.push(node);
                }
            }
            "class_pattern" => {
                let mut parts = named(node).into_iter();
                found.extend(parts.next().filter(|head| head.kind() == "dotted_name"));
                pending.extend(parts);
            }
            _ => pending.extend(named(node)),
        }
    }
    found.sort_by_key(Node::start_byte);
    found
}

/// CST → AST lowering state
struct Lowering<'s> {
    source: &'s str,
    depth: usize,
    max_depth: usize,
}

impl<'s> Lowering<'s> {
    fn text(&self, node: Node<'_>) -> &'s str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// Identifier-like text with interior whitespace removed (`a . b` → `a.b`)
    fn dotted(&self, node: Node<'_>) -> String {
        self.text(node).split_whitespace().collect()
    }

    fn descend(&mut self, node: Node<'_>) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.max_depth,
                position: position(node),
            });
        }
        Ok(())
    }

    // ----- statements -----

    fn block(&mut self, node: Node<'_>) -> Result<Vec<Stmt>, ParseError> {
        named(node)
            .into_iter()
            .map(|child| self.statement(child))
            .collect()
    }

    fn optional_block(&mut self, clause: Option<Node<'_>>) -> Result<Vec<Stmt>, ParseError> {
        match clause {
            Some(clause) => self.block(required(clause, "body")?),
            None => Ok(Vec::new()),
        }
    }

    fn statement(&mut self, node: Node<'_>) -> Result<Stmt, ParseError> {
        self.descend(node)?;
        let stmt = self.statement_inner(node);
        self.depth -= 1;
        stmt
    }

    fn statement_inner(&mut self, node: Node<'_>) -> Result<Stmt, ParseError> {
        let stmt = match node.kind() {
            "expression_statement" => self.expression_statement(node)?,
            "return_statement" => Stmt::Return(self.optional_first(node)?),
            "delete_statement" => {
                let target = first_named(node)?;
                Stmt::Delete(self.sequence(target)?)
            }
            "raise_statement" => {
                let cause = node.child_by_field_name("cause");
                let exc = named(node)
                    .into_iter()
                    .find(|c| Some(c.id()) != cause.map(|n| n.id()));
                Stmt::Raise {
                    exc: exc.map(|n| self.expr(n)).transpose()?,
                    cause: cause.map(|n| self.expr(n)).transpose()?,
                }
            }
            "assert_statement" => {
                let parts = named(node);
                match parts.as_slice() {
                    [test] => Stmt::Assert {
                        test: self.expr(*test)?,
                        msg: None,
                    },
                    [test, msg] => Stmt::Assert {
                        test: self.expr(*test)?,
                        msg: Some(self.expr(*msg)?),
                    },
                    _ => return Err(unsupported(node)),
                }
            }
            "pass_statement" => Stmt::Pass,
            "break_statement" => Stmt::Break,
            "continue_statement" => Stmt::Continue,
            "global_statement" => Stmt::Global(self.identifiers(node)),
            "nonlocal_statement" => Stmt::Nonlocal(self.identifiers(node)),
            "import_statement" => Stmt::Import(self.aliases(node)?),
            "import_from_statement" => {
                let module = self.dotted(required(node, "module_name")?);
                let names = if named(node).iter().any(|c| c.kind() == "wildcard_import") {
                    vec![Alias::plain("*")]
                } else {
                    self.aliases(node)?
                };
                Stmt::ImportFrom { module, names }
            }
            "future_import_statement" => Stmt::ImportFrom {
                module: "__future__".to_string(),
                names: self.aliases(node)?,
            },
            "if_statement" => self.if_statement(node)?,
            "for_statement" => Stmt::For(For {
                is_async: is_async(node),
                target: self.expr(required(node, "left")?)?,
                iter: self.expr(required(node, "right")?)?,
                body: self.block(required(node, "body")?)?,
                orelse: self.optional_block(node.child_by_field_name("alternative"))?,
            }),
            "while_statement" => Stmt::While {
                test: self.expr(required(node, "condition")?)?,
                body: self.block(required(node, "body")?)?,
                orelse: self.optional_block(node.child_by_field_name("alternative"))?,
            },
            "try_statement" => self.try_statement(node)?,
            "with_statement" => self.with_statement(node)?,
            "function_definition" => Stmt::FunctionDef(self.function(node, Vec::new())?),
            "class_definition" => Stmt::ClassDef(self.class(node, Vec::new())?),
            "decorated_definition" => self.decorated(node)?,
            "match_statement" => self.match_statement(node)?,
            "print_statement" | "exec_statement" => {
                let keyword = node.kind().trim_end_matches("_statement");
                return Err(ParseError::syntax(
                    format!("Python 2 `{}` statement", keyword),
                    position(node),
                ));
            }
            _ => return Err(unsupported(node)),
        };
        Ok(stmt)
    }

    fn expression_statement(&mut self, node: Node<'_>) -> Result<Stmt, ParseError> {
        let parts = named(node);
        match parts.as_slice() {
            [single] if single.kind() == "assignment" => self.assignment(*single),
            [single] if single.kind() == "augmented_assignment" => {
                let operator = required(*single, "operator")?;
                let op = operator
                    .kind()
                    .strip_suffix('=')
                    .and_then(BinOp::from_symbol)
                    .ok_or_else(|| unsupported(operator))?;
                Ok(Stmt::AugAssign {
                    target: self.expr(required(*single, "left")?)?,
                    op,
                    value: self.expr(required(*single, "right")?)?,
                })
            }
            [single] if !has_token(node, ",") => Ok(Stmt::Expr(self.expr(*single)?)),
            _ => Ok(Stmt::Expr(Expr::Tuple {
                elts: self.exprs(&parts)?,
                parenthesized: false,
            })),
        }
    }

    fn assignment(&mut self, node: Node<'_>) -> Result<Stmt, ParseError> {
        let left = required(node, "left")?;

        if let Some(annotation) = node.child_by_field_name("type") {
            return Ok(Stmt::AnnAssign {
                target: self.expr(left)?,
                annotation: self.expr(annotation)?,
                value: node
                    .child_by_field_name("right")
                    .map(|n| self.expr(n))
                    .transpose()?,
            });
        }

        // `a = b = value` nests assignments on the right
        let mut targets = vec![self.expr(left)?];
        let mut right = required(node, "right")?;
        while right.kind() == "assignment" {
            if right.child_by_field_name("type").is_some() {
                return Err(unsupported(right));
            }
            targets.push(self.expr(required(right, "left")?)?);
            right = required(right, "right")?;
        }
        if right.kind() == "augmented_assignment" {
            return Err(unsupported(right));
        }

        Ok(Stmt::Assign {
            targets,
            value: self.expr(right)?,
        })
    }

    fn if_statement(&mut self, node: Node<'_>) -> Result<Stmt, ParseError> {
        let test = self.expr(required(node, "condition")?)?;
        let body = self.block(required(node, "consequence")?)?;

        let mut orelse = Vec::new();
        for clause in field_all(node, "alternative").into_iter().rev() {
            match clause.kind() {
                "else_clause" => orelse = self.block(required(clause, "body")?)?,
                "elif_clause" => {
                    let test = self.expr(required(clause, "condition")?)?;
                    let body = self.block(required(clause, "consequence")?)?;
                    orelse = vec![Stmt::If {
                        test,
                        body,
                        orelse: std::mem::take(&mut orelse),
                    }];
                }
                _ => return Err(unsupported(clause)),
            }
        }

        Ok(Stmt::If { test, body, orelse })
    }

    fn try_statement(&mut self, node: Node<'_>) -> Result<Stmt, ParseError> {
        let body_node = required(node, "body")?;
        let mut stmt = Try {
            body: self.block(body_node)?,
            handlers: Vec::new(),
            orelse: Vec::new(),
            finalbody: Vec::new(),
        };

        for child in named(node) {
            if child.id() == body_node.id() {
                continue;
            }
            match child.kind() {
                "except_clause" | "except_group_clause" => stmt.handlers.push(self.handler(child)?),
                "else_clause" => stmt.orelse = self.block(required(child, "body")?)?,
                "finally_clause" => {
                    let block = named(child)
                        .into_iter()
                        .find(|c| c.kind() == "block")
                        .ok_or_else(|| unsupported(child))?;
                    stmt.finalbody = self.block(block)?;
                }
                _ => return Err(unsupported(child)),
            }
        }

        Ok(Stmt::Try(stmt))
    }

    fn handler(&mut self, node: Node<'_>) -> Result<ExceptHandler, ParseError> {
        let parts = named(node);
        let body_node = parts
            .iter()
            .rev()
            .find(|c| c.kind() == "block")
            .copied()
            .ok_or_else(|| unsupported(node))?;
        let heads: Vec<Node<'_>> = parts
            .into_iter()
            .filter(|c| c.id() != body_node.id())
            .collect();

        let (kind, name) = match heads.as_slice() {
            [] => (None, None),
            [single] if single.kind() == "as_pattern" => {
                let kind = self.expr(first_named(*single)?)?;
                let alias = required(*single, "alias")?;
                (Some(kind), Some(self.dotted(alias)))
            }
            [single] => (Some(self.expr(*single)?), None),
            [kind, alias] => (Some(self.expr(*kind)?), Some(self.dotted(*alias))),
            _ => return Err(unsupported(node)),
        };

        Ok(ExceptHandler {
            is_star: node.kind() == "except_group_clause" || has_token(node, "except*"),
            kind,
            name,
            body: self.block(body_node)?,
        })
    }

    fn match_statement(&mut self, node: Node<'_>) -> Result<Stmt, ParseError> {
        let subjects = field_all(node, "subject");
        let subject = match subjects.as_slice() {
            [] => return Err(unsupported(node)),
            [single] if !has_token(node, ",") => self.expr(*single)?,
            _ => Expr::Tuple {
                elts: self.exprs(&subjects)?,
                parenthesized: false,
            },
        };

        let cases = named(required(node, "body")?)
            .into_iter()
            .map(|clause| match clause.kind() {
                "case_clause" => self.case_clause(clause),
                _ => Err(unsupported(clause)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Stmt::Match { subject, cases })
    }

    fn case_clause(&mut self, node: Node<'_>) -> Result<MatchCase, ParseError> {
        let tokens = children(node);
        let patterns: Vec<Node<'_>> = tokens
            .iter()
            .filter(|c| c.kind() == "case_pattern")
            .copied()
            .collect();
        let (Some(first), Some(last)) = (patterns.first(), patterns.last()) else {
            return Err(ParseError::syntax("`case` without a pattern", position(node)));
        };
        // `case 1,:` is a one-element sequence pattern
        let end = tokens
            .iter()
            .filter(|c| c.kind() == "," && c.start_byte() >= last.end_byte())
            .map(Node::end_byte)
            .next()
            .unwrap_or(last.end_byte());

        let mut pattern = Vec::new();
        self.splice(first.start_byte(), end, &pattern_references(&patterns), &mut pattern)?;

        Ok(MatchCase {
            pattern,
            guard: node
                .child_by_field_name("guard")
                .map(|guard| first_named(guard).and_then(|test| self.expr(test)))
                .transpose()?,
            body: self.block(required(node, "consequence")?)?,
        })
    }

    /// Source text in `start..end` with `embedded` nodes lowered to expressions
    fn splice(
        &mut self,
        start: usize,
        end: usize,
        embedded: &[Node<'_>],
        segments: &mut Vec<Segment>,
    ) -> Result<(), ParseError> {
        let mut cursor = start;
        for node in embedded {
            Segment::push_text(segments, self.source.get(cursor..node.start_byte()).unwrap_or(""));
            segments.push(Segment::Expr(self.expr(*node)?));
            cursor = node.end_byte();
        }
        Segment::push_text(segments, self.source.get(cursor..end).unwrap_or(""));
        Ok(())
    }

    fn with_statement(&mut self, node: Node<'_>) -> Result<Stmt, ParseError> {
        let clause = named(node)
            .into_iter()
            .find(|c| c.kind() == "with_clause")
            .ok_or_else(|| unsupported(node))?;

        let items = named(clause)
            .into_iter()
            .filter(|c| c.kind() == "with_item")
            .map(|item| self.with_item(item))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Stmt::With(With {
            is_async: is_async(node),
            items,
            body: self.block(required(node, "body")?)?,
        }))
    }

    fn with_item(&mut self, item: Node<'_>) -> Result<WithItem, ParseError> {
        let value = required(item, "value")?;
        if value.kind() != "as_pattern" {
            return Ok(WithItem {
                context: self.expr(value)?,
                target: None,
            });
        }

        let context = self.expr(first_named(value)?)?;
        let alias = required(value, "alias")?;
        let target = match named(alias).into_iter().next() {
            Some(inner) => self.expr(inner)?,
            None => Expr::Name(self.text(alias).trim().to_string()),
        };
        Ok(WithItem {
            context,
            target: Some(target),
        })
    }

    fn function(&mut self, node: Node<'_>, decorators: Vec<Expr>) -> Result<FunctionDef, ParseError> {
        if let Some(type_params) = node.child_by_field_name("type_parameters") {
            return Err(unsupported(type_params));
        }

        Ok(FunctionDef {
            is_async: is_async(node),
            name: self.text(required(node, "name")?).to_string(),
            params: self.params(required(node, "parameters")?)?,
            returns: node
                .child_by_field_name("return_type")
                .map(|n| self.expr(n))
                .transpose()?,
            body: self.block(required(node, "body")?)?,
            decorators,
        })
    }

    fn class(&mut self, node: Node<'_>, decorators: Vec<Expr>) -> Result<ClassDef, ParseError> {
        if let Some(type_params) = node.child_by_field_name("type_parameters") {
            return Err(unsupported(type_params));
        }

        Ok(ClassDef {
            name: self.text(required(node, "name")?).to_string(),
            bases: match node.child_by_field_name("superclasses") {
                Some(list) => self.arguments(list)?,
                None => Vec::new(),
            },
            body: self.block(required(node, "body")?)?,
            decorators,
        })
    }

    fn decorated(&mut self, node: Node<'_>) -> Result<Stmt, ParseError> {
        let decorators = named(node)
            .into_iter()
            .filter(|c| c.kind() == "decorator")
            .map(|d| first_named(d).and_then(|e| self.expr(e)))
            .collect::<Result<Vec<_>, _>>()?;

        let definition = required(node, "definition")?;
        match definition.kind() {
            "function_definition" => Ok(Stmt::FunctionDef(self.function(definition, decorators)?)),
            "class_definition" => Ok(Stmt::ClassDef(self.class(definition, decorators)?)),
            _ => Err(unsupported(definition)),
        }
    }

    fn optional_first(&mut self, node: Node<'_>) -> Result<Option<Expr>, ParseError> {
        named(node).into_iter().next().map(|n| self.expr(n)).transpose()
    }

    fn identifiers(&self, node: Node<'_>) -> Vec<String> {
        named(node)
            .into_iter()
            .filter(|c| c.kind() == "identifier")
            .map(|c| self.text(c).to_string())
            .collect()
    }

    fn aliases(&self, node: Node<'_>) -> Result<Vec<Alias>, ParseError> {
        field_all(node, "name")
            .into_iter()
            .map(|name| match name.kind() {
                "dotted_name" => Ok(Alias::plain(self.dotted(name))),
                "aliased_import" => Ok(Alias {
                    name: self.dotted(required(name, "name")?),
                    asname: Some(self.dotted(required(name, "alias")?)),
                }),
                _ => Err(unsupported(name)),
            })
            .collect()
    }

    // ----- parameters and arguments -----

    fn params(&mut self, node: Node<'_>) -> Result<Vec<Param>, ParseError> {
        named(node)
            .into_iter()
            .map(|child| self.param(child))
            .collect()
    }

    fn param(&mut self, node: Node<'_>) -> Result<Param, ParseError> {
        let param = match node.kind() {
            "identifier" => Param::Plain {
                name: self.text(node).to_string(),
                annotation: None,
                default: None,
            },
            "typed_parameter" => {
                let annotation = Some(self.expr(required(node, "type")?)?);
                let inner = first_named(node)?;
                match inner.kind() {
                    "identifier" => Param::Plain {
                        name: self.text(inner).to_string(),
                        annotation,
                        default: None,
                    },
                    "list_splat_pattern" => Param::VarArgs {
                        name: self.text(first_named(inner)?).to_string(),
                        annotation,
                    },
                    "dictionary_splat_pattern" => Param::KwArgs {
                        name: self.text(first_named(inner)?).to_string(),
                        annotation,
                    },
                    _ => return Err(unsupported(inner)),
                }
            }
            "default_parameter" | "typed_default_parameter" => {
                let name = required(node, "name")?;
                if name.kind() != "identifier" {
                    return Err(unsupported(name));
                }
                Param::Plain {
                    name: self.text(name).to_string(),
                    annotation: node
                        .child_by_field_name("type")
                        .map(|n| self.expr(n))
                        .transpose()?,
                    default: Some(self.expr(required(node, "value")?)?),
                }
            }
            "list_splat_pattern" => Param::VarArgs {
                name: self.text(first_named(node)?).to_string(),
                annotation: None,
            },
            "dictionary_splat_pattern" => Param::KwArgs {
                name: self.text(first_named(node)?).to_string(),
                annotation: None,
            },
            "keyword_separator" => Param::KeywordOnlyMarker,
            "positional_separator" => Param::PositionalOnlyMarker,
            _ => return Err(unsupported(node)),
        };
        Ok(param)
    }

    fn arguments(&mut self, node: Node<'_>) -> Result<Vec<Arg>, ParseError> {
        named(node)
            .into_iter()
            .map(|child| match child.kind() {
                "keyword_argument" => Ok(Arg::Keyword {
                    name: self.text(required(child, "name")?).to_string(),
                    value: self.expr(required(child, "value")?)?,
                }),
                "dictionary_splat" => Ok(Arg::KeywordUnpack(self.expr(first_named(child)?)?)),
                _ => Ok(Arg::Positional(self.expr(child)?)),
            })
            .collect()
    }

    // ----- expressions -----

    fn exprs(&mut self, nodes: &[Node<'_>]) -> Result<Vec<Expr>, ParseError> {
        nodes.iter().map(|n| self.expr(*n)).collect()
    }

    /// Elements of an unparenthesized `a, b` list, or the single expression
    fn sequence(&mut self, node: Node<'_>) -> Result<Vec<Expr>, ParseError> {
        if node.kind() == "expression_list" {
            self.exprs(&named(node))
        } else {
            Ok(vec![self.expr(node)?])
        }
    }

    fn boxed(&mut self, node: Node<'_>) -> Result<Box<Expr>, ParseError> {
        self.expr(node).map(Box::new)
    }

    fn expr(&mut self, node: Node<'_>) -> Result<Expr, ParseError> {
        self.descend(node)?;
        let expr = self.expr_inner(node);
        self.depth -= 1;
        expr
    }

    fn expr_inner(&mut self, node: Node<'_>) -> Result<Expr, ParseError> {
        let expr = match node.kind() {
            "identifier" | "keyword_identifier" => Expr::Name(self.text(node).to_string()),
            "integer" => {
                let text = self.text(node);
                IntLiteral::parse(text).map_or_else(|| Expr::Number(text.to_string()), Expr::Int)
            }
            "float" => Expr::Number(self.text(node).to_string()),
            "string" | "concatenated_string" => self.string(node)?,
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            "none" => Expr::None,
            "ellipsis" => Expr::Ellipsis,
            "binary_operator" | "boolean_operator" => self.operator_chain(node)?,
            "unary_operator" => {
                let operator = required(node, "operator")?;
                let op = match operator.kind() {
                    "+" => UnaryOp::Plus,
                    "-" => UnaryOp::Minus,
                    "~" => UnaryOp::Invert,
                    _ => return Err(unsupported(operator)),
                };
                Expr::UnaryOp {
                    op,
                    operand: self.boxed(required(node, "argument")?)?,
                }
            }
            "not_operator" => Expr::UnaryOp {
                op: UnaryOp::Not,
                operand: self.boxed(required(node, "argument")?)?,
            },
            "comparison_operator" => self.comparison(node)?,
            "call" => {
                let func = self.boxed(required(node, "function")?)?;
                let arguments = required(node, "arguments")?;
                let args = if arguments.kind() == "generator_expression" {
                    vec![Arg::Positional(self.expr(arguments)?)]
                } else {
                    self.arguments(arguments)?
                };
                Expr::Call { func, args }
            }
            "attribute" => Expr::Attribute {
                value: self.boxed(required(node, "object")?)?,
                attr: self.text(required(node, "attribute")?).to_string(),
            },
            "subscript" => {
                let value = self.boxed(required(node, "value")?)?;
                let mut indices = self.exprs(&field_all(node, "subscript"))?;
                // `x[a,]` indexes with a one-element tuple
                if indices.len() == 1 && has_token(node, ",") {
                    indices = vec![Expr::Tuple {
                        elts: indices,
                        parenthesized: false,
                    }];
                }
                Expr::Subscript { value, indices }
            }
            "slice" => self.slice(node)?,
            "list" | "list_pattern" => Expr::List(self.exprs(&named(node))?),
            "set" => Expr::Set(self.exprs(&named(node))?),
            "tuple" | "tuple_pattern" => Expr::Tuple {
                elts: self.exprs(&named(node))?,
                parenthesized: true,
            },
            "expression_list" | "pattern_list" => Expr::Tuple {
                elts: self.exprs(&named(node))?,
                parenthesized: false,
            },
            "dictionary" => Expr::Dict(self.dict_items(node)?),
            "parenthesized_expression" | "parenthesized_list_splat" => {
                Expr::Paren(self.boxed(first_named(node)?)?)
            }
            "conditional_expression" => {
                let parts = named(node);
                let [body, test, orelse] = parts.as_slice() else {
                    return Err(unsupported(node));
                };
                Expr::IfExp {
                    body: self.boxed(*body)?,
                    test: self.boxed(*test)?,
                    orelse: self.boxed(*orelse)?,
                }
            }
            "lambda" => Expr::Lambda {
                params: match node.child_by_field_name("parameters") {
                    Some(params) => self.params(params)?,
                    None => Vec::new(),
                },
                body: self.boxed(required(node, "body")?)?,
            },
            "named_expression" => Expr::NamedExpr {
                target: Box::new(Expr::Name(self.text(required(node, "name")?).to_string())),
                value: self.boxed(required(node, "value")?)?,
            },
            "await" => Expr::Await(self.boxed(first_named(node)?)?),
            "yield" => {
                let value = named(node).into_iter().next();
                if has_token(node, "from") {
                    let value = value.ok_or_else(|| unsupported(node))?;
                    Expr::YieldFrom(self.boxed(value)?)
                } else {
                    Expr::Yield(value.map(|v| self.boxed(v)).transpose()?)
                }
            }
            "list_comprehension" => self.comprehension(node, CompKind::List)?,
            "set_comprehension" => self.comprehension(node, CompKind::Set)?,
            "generator_expression" => self.comprehension(node, CompKind::Generator)?,
            "dictionary_comprehension" => {
                let body = required(node, "body")?;
                if body.kind() != "pair" {
                    return Err(unsupported(body));
                }
                Expr::DictComp {
                    key: self.boxed(required(body, "key")?)?,
                    value: self.boxed(required(body, "value")?)?,
                    generators: self.clauses(node, body)?,
                }
            }
            "list_splat" | "list_splat_pattern" => Expr::Starred(self.boxed(first_named(node)?)?),
            "type" => self.expr(first_named(node)?)?,
            // value and class references inside `case` patterns
            "dotted_name" => {
                let mut parts = named(node)
                    .into_iter()
                    .map(|part| self.text(part).to_string());
                let head = parts.next().ok_or_else(|| unsupported(node))?;
                parts.fold(Expr::Name(head), |value, attr| Expr::Attribute {
                    value: Box::new(value),
                    attr,
                })
            }
            _ => return Err(unsupported(node)),
        };
        Ok(expr)
    }

    /// Plain strings stay opaque; f-strings expose their interpolations
    fn string(&mut self, node: Node<'_>) -> Result<Expr, ParseError> {
        let pieces = if node.kind() == "concatenated_string" {
            named(node)
        } else {
            vec![node]
        };

        let mut segments = Vec::new();
        for (i, piece) in pieces.into_iter().enumerate() {
            if i > 0 {
                Segment::push_text(&mut segments, " ");
            }
            self.splice(piece.start_byte(), piece.end_byte(), &interpolations(piece), &mut segments)?;
        }

        Ok(match segments.pop() {
            None => Expr::Str(String::new()),
            Some(Segment::Text(text)) if segments.is_empty() => Expr::Str(text),
            Some(last) => {
                segments.push(last);
                Expr::FString(segments)
            }
        })
    }

    /// Left-nested `a + b + c` and `a and b and c` chains
    ///
    /// The spine is walked iteratively. Each [`CHAIN_LINKS_PER_LEVEL`]
    /// further operators count as one nesting level.
    fn operator_chain(&mut self, node: Node<'_>) -> Result<Expr, ParseError> {
        let mut spine = vec![node];
        let mut leaf = required(node, "left")?;
        while leaf.kind() == node.kind() {
            spine.push(leaf);
            leaf = required(leaf, "left")?;
        }

        let extra = (spine.len() - 1).div_ceil(CHAIN_LINKS_PER_LEVEL);
        if self.depth + extra > self.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.max_depth,
                position: position(node),
            });
        }

        self.depth += extra;
        let mut acc = self.expr(leaf)?;
        for link in spine.into_iter().rev() {
            let left = Box::new(acc);
            let operator = required(link, "operator")?;
            let right = self.boxed(required(link, "right")?)?;
            acc = if link.kind() == "boolean_operator" {
                let op = match operator.kind() {
                    "and" => BoolOp::And,
                    "or" => BoolOp::Or,
                    _ => return Err(unsupported(operator)),
                };
                Expr::BoolOp { left, op, right }
            } else {
                let op = BinOp::from_symbol(operator.kind()).ok_or_else(|| unsupported(operator))?;
                Expr::BinOp { left, op, right }
            };
        }
        self.depth -= extra;
        Ok(acc)
    }

    fn comparison(&mut self, node: Node<'_>) -> Result<Expr, ParseError> {
        let mut operands = Vec::new();
        let mut ops = Vec::new();
        // `not in` / `is not` may arrive as one token or two
        let mut pending: Option<String> = None;

        for child in children(node) {
            if child.is_named() {
                if let Some(symbol) = pending.take() {
                    ops.push(CmpOp::from_symbol(&symbol).ok_or_else(|| unsupported(node))?);
                }
                operands.push(self.expr(child)?);
            } else {
                pending = Some(match pending.take() {
                    Some(prev) => format!("{} {}", prev, child.kind()),
                    None => child.kind().to_string(),
                });
            }
        }

        if operands.len() < 2 || ops.len() + 1 != operands.len() {
            return Err(ParseError::syntax("malformed comparison", position(node)));
        }

        let mut operands = operands.into_iter();
        let left = Box::new(operands.next().ok_or_else(|| unsupported(node))?);
        Ok(Expr::Compare {
            left,
            comparisons: ops.into_iter().zip(operands).collect(),
        })
    }

    fn slice(&mut self, node: Node<'_>) -> Result<Expr, ParseError> {
        let mut parts: [Option<Box<Expr>>; 3] = [None, None, None];
        let mut slot = 0;

        for child in children(node) {
            if !child.is_named() {
                if child.kind() == ":" {
                    slot += 1;
                }
                continue;
            }
            let Some(part) = parts.get_mut(slot) else {
                return Err(unsupported(node));
            };
            *part = Some(self.boxed(child)?);
        }

        let [lower, upper, step] = parts;
        Ok(Expr::Slice { lower, upper, step })
    }

    fn dict_items(&mut self, node: Node<'_>) -> Result<Vec<DictItem>, ParseError> {
        named(node)
            .into_iter()
            .map(|child| match child.kind() {
                "pair" => Ok(DictItem::Pair {
                    key: self.expr(required(child, "key")?)?,
                    value: self.expr(required(child, "value")?)?,
                }),
                "dictionary_splat" => Ok(DictItem::Unpack(self.expr(first_named(child)?)?)),
                _ => Err(unsupported(child)),
            })
            .collect()
    }

    fn comprehension(&mut self, node: Node<'_>, kind: CompKind) -> Result<Expr, ParseError> {
        let body = required(node, "body")?;
        Ok(Expr::Comp {
            kind,
            element: self.boxed(body)?,
            generators: self.clauses(node, body)?,
        })
    }

    /// `for`/`if` clauses following a comprehension body
    fn clauses(&mut self, node: Node<'_>, body: Node<'_>) -> Result<Vec<Comprehension>, ParseError> {
        let mut generators: Vec<Comprehension> = Vec::new();

        for child in named(node) {
            if child.id() == body.id() {
                continue;
            }
            match child.kind() {
                "for_in_clause" => {
                    let target = self.expr(required(child, "left")?)?;
                    let rights = field_all(child, "right");
                    let iter = match rights.as_slice() {
                        [] => return Err(unsupported(child)),
                        [single] => self.expr(*single)?,
                        _ => Expr::Tuple {
                            elts: self.exprs(&rights)?,
                            parenthesized: false,
                        },
                    };
                    generators.push(Comprehension {
                        is_async: is_async(child),
                        target,
                        iter,
                        ifs: Vec::new(),
                    });
                }
                "if_clause" => {
                    let test = self.expr(first_named(child)?)?;
                    generators
                        .last_mut()
                        .ok_or_else(|| ParseError::syntax("`if` clause before `for`", position(child)))?
                        .ifs
                        .push(test);
                }
                _ => return Err(unsupported(child)),
            }
        }

        Ok(generators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Module {
        PythonParser::new().parse(source).unwrap()
    }

    #[test]
    fn parses_simple_assignment() {
        let module = parse("x = 1\n");
        assert_eq!(
            module.body,
            vec![Stmt::Assign {
                targets: vec![Expr::name("x")],
                value: Expr::Int(IntLiteral::new(1)),
            }]
        );
    }

    #[test]
    fn chained_assignment_collects_targets() {
        let module = parse("a = b = 2\n");
        let Stmt::Assign { targets, .. } = &module.body[0] else {
            panic!("expected assignment");
        };
        assert_eq!(targets, &vec![Expr::name("a"), Expr::name("b")]);
    }

    #[test]
    fn elif_chain_nests_in_orelse() {
        let module = parse("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        let Stmt::If { orelse, .. } = &module.body[0] else {
            panic!("expected if");
        };
        assert_eq!(orelse.len(), 1);
        let Stmt::If { orelse: inner, .. } = &orelse[0] else {
            panic!("expected nested if");
        };
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn function_with_decorator_and_params() {
        let module = parse("@cache\ndef add(a, b=1, *rest, key: int = 2, **kw) -> int:\n    return a + b\n");
        let Stmt::FunctionDef(def) = &module.body[0] else {
            panic!("expected function");
        };
        assert_eq!(def.name, "add");
        assert_eq!(def.decorators, vec![Expr::name("cache")]);
        assert_eq!(def.params.len(), 5);
        assert!(matches!(def.params[2], Param::VarArgs { .. }));
        assert!(matches!(def.params[4], Param::KwArgs { .. }));
        assert!(def.returns.is_some());
    }

    #[test]
    fn comments_are_dropped() {
        let module = parse("# leading\nx = 1  # trailing\n");
        assert_eq!(module.body.len(), 1);
    }

    #[test]
    fn not_in_comparison() {
        let module = parse("a not in b\n");
        let Stmt::Expr(Expr::Compare { comparisons, .. }) = &module.body[0] else {
            panic!("expected comparison");
        };
        assert_eq!(comparisons[0].0, CmpOp::NotIn);
    }

    #[test]
    fn except_alias_is_plain_name() {
        let module = parse("try:\n    pass\nexcept ValueError as err:\n    pass\n");
        let Stmt::Try(stmt) = &module.body[0] else {
            panic!("expected try");
        };
        assert_eq!(stmt.handlers[0].name.as_deref(), Some("err"));
        assert_eq!(stmt.handlers[0].kind, Some(Expr::name("ValueError")));
    }

    #[test]
    fn invalid_syntax_reports_position() {
        let err = PythonParser::new().parse("x = = 1\n").unwrap_err();
        let position = err.position().expect("syntax errors carry a position");
        assert_eq!(position.line, 1);
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn error_on_later_line_is_located() {
        let err = PythonParser::new().parse("x = 1\ny = (\n").unwrap_err();
        assert!(err.position().unwrap().line >= 2);
    }

    #[test]
    fn python2_print_is_a_syntax_error() {
        let err = PythonParser::new().parse("print 'hello'\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }), "{:?}", err);
    }

    fn value_of(source: &str) -> Expr {
        match parse(source).body.into_iter().next() {
            Some(Stmt::Assign { value, .. }) => value,
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn f_string_exposes_interpolations() {
        let value = value_of("s = f\"{name}: {count + 1}\"\n");
        assert_eq!(
            value,
            Expr::FString(vec![
                Segment::Text("f\"{".into()),
                Segment::Expr(Expr::name("name")),
                Segment::Text("}: {".into()),
                Segment::Expr(Expr::BinOp {
                    left: Box::new(Expr::name("count")),
                    op: BinOp::Add,
                    right: Box::new(Expr::Int(IntLiteral::new(1))),
                }),
                Segment::Text("}\"".into()),
            ])
        );
    }

    #[test]
    fn format_spec_interpolations_follow_source_order() {
        let Expr::FString(segments) = value_of("s = f\"{x!r:>{width}}\"\n") else {
            panic!("expected f-string");
        };
        let embedded: Vec<&Expr> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Expr(e) => Some(e),
                Segment::Text(_) => None,
            })
            .collect();
        assert_eq!(embedded, vec![&Expr::name("x"), &Expr::name("width")]);
    }

    #[test]
    fn strings_without_interpolation_stay_opaque() {
        assert_eq!(value_of("s = 'a' \"b\"\n"), Expr::Str("'a' \"b\"".into()));
        assert_eq!(value_of("s = f\"plain\"\n"), Expr::Str("f\"plain\"".into()));
        assert_eq!(
            value_of("s = 'a' f\"{b}\"\n"),
            Expr::FString(vec![
                Segment::Text("'a' f\"{".into()),
                Segment::Expr(Expr::name("b")),
                Segment::Text("}\"".into()),
            ])
        );
    }

    #[test]
    fn match_statement_is_lowered() {
        let source = "\
match command.split():
    case [action]:
        pass
    case Point(x=0) if x > limit:
        pass
    case Color.RED | 1,:
        pass
";
        let module = parse(source);
        let Stmt::Match { subject, cases } = &module.body[0] else {
            panic!("expected match");
        };
        assert!(matches!(subject, Expr::Call { .. }));
        assert_eq!(cases.len(), 3);

        assert_eq!(cases[0].pattern, vec![Segment::Text("[action]".into())]);
        assert!(cases[0].guard.is_none());

        assert_eq!(
            cases[1].pattern,
            vec![
                Segment::Expr(Expr::name("Point")),
                Segment::Text("(x=0)".into()),
            ]
        );
        assert!(matches!(cases[1].guard, Some(Expr::Compare { .. })));

        assert_eq!(
            cases[2].pattern,
            vec![
                Segment::Expr(Expr::Attribute {
                    value: Box::new(Expr::name("Color")),
                    attr: "RED".into(),
                }),
                Segment::Text(" | 1,".into()),
            ]
        );
        assert_eq!(cases[2].body, vec![Stmt::Pass]);
    }

    #[test]
    fn match_on_several_subjects_is_a_tuple() {
        let module = parse("match a, b:\n    case _:\n        pass\n");
        let Stmt::Match { subject, .. } = &module.body[0] else {
            panic!("expected match");
        };
        assert_eq!(
            subject,
            &Expr::Tuple {
                elts: vec![Expr::name("a"), Expr::name("b")],
                parenthesized: false,
            }
        );
    }

    #[test]
    fn soft_keyword_match_is_still_a_name() {
        let module = parse("match = 1\n");
        assert!(matches!(&module.body[0], Stmt::Assign { targets, .. } if targets == &vec![Expr::name("match")]));
    }

    #[test]
    fn long_flat_chains_parse() {
        let sum = format!("x = {}\n", vec!["1"; 300].join(" + "));
        let Expr::BinOp { op, .. } = value_of(&sum) else {
            panic!("expected binary operation");
        };
        assert_eq!(op, BinOp::Add);

        let all = format!("x = {}\n", vec!["a"; 300].join(" and "));
        assert!(matches!(value_of(&all), Expr::BoolOp { op: BoolOp::And, .. }));
    }

    #[test]
    fn chain_keeps_left_associativity() {
        let value = value_of("x = a - b + c\n");
        let Expr::BinOp { left, op: BinOp::Add, right } = value else {
            panic!("expected addition at the top");
        };
        assert!(matches!(*left, Expr::BinOp { op: BinOp::Sub, .. }));
        assert_eq!(*right, Expr::name("c"));
    }

    #[test]
    fn oversized_chain_is_too_deep() {
        let source = format!("x = {}\n", vec!["1"; 2000].join(" + "));
        let err = PythonParser::new().parse(&source).unwrap_err();
        assert!(matches!(err, ParseError::TooDeep { limit: DEFAULT_MAX_DEPTH, .. }), "{:?}", err);
    }

    #[test]
    fn nesting_limit_is_enforced() {
        let source = format!("x = {}1{}\n", "(".repeat(40), ")".repeat(40));
        let err = PythonParser::new().with_max_depth(16).parse(&source).unwrap_err();
        assert!(matches!(err, ParseError::TooDeep { limit: 16, .. }));

        assert!(PythonParser::new().parse(&source).is_ok());
    }
}
