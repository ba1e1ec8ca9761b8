use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, ExportDefaultDeclarationKind, Expression, ObjectPropertyKind, Program, Statement,
};
use oxc_parser::Parser;
use oxc_span::SourceType;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    pub source: String,
    pub kind: ImportKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Static,
    SideEffect,
    Dynamic,
    Require,
    ExportFrom,
    ExportStar,
}

/// A top-level call of a plain function with a string literal as first argument,
/// e.g. `injectStyle("body{}")`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringCall {
    pub callee: String,
    pub argument: String,
}

/// What a module imports, which string calls it makes at the top level,
/// and the default-exported object literal if it has one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleAnalysis {
    pub imports: Vec<ImportInfo>,
    pub calls: Vec<StringCall>,
    /// Default-exported object literal with string keys and string values
    pub default_export: Option<BTreeMap<String, String>>,
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to parse {name}: {message}")]
    ParseFailed { name: String, message: String },
}

/// Parse module source and report every syntax error together
fn parse_program<'a>(
    allocator: &'a Allocator,
    source: &'a str,
    source_type: SourceType,
    name: &str,
) -> Result<Program<'a>, ParseError> {
    let parsed = Parser::new(allocator, source, source_type).parse();

    if parsed.panicked || !parsed.errors.is_empty() {
        let message = if parsed.errors.is_empty() {
            "parser panicked".to_string()
        } else {
            parsed.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
        };
        return Err(ParseError::ParseFailed { name: name.to_string(), message });
    }

    Ok(parsed.program)
}

/// Extract import specifiers from module source
pub fn extract_imports(
    source: &str,
    source_type: SourceType,
    name: &str,
) -> Result<Vec<ImportInfo>, ParseError> {
    let allocator = Allocator::default();
    let program = parse_program(&allocator, source, source_type, name)?;

    let mut imports = Vec::new();
    for stmt in &program.body {
        extract_from_statement(stmt, &mut imports);
    }
    Ok(imports)
}

/// Analyze an ES module: imports, top-level string calls and the default export
pub fn analyze_module(source: &str) -> Result<ModuleAnalysis, ParseError> {
    let allocator = Allocator::default();
    let program = parse_program(&allocator, source, SourceType::mjs(), "generated module")?;

    let mut analysis = ModuleAnalysis::default();

    for stmt in &program.body {
        extract_from_statement(stmt, &mut analysis.imports);

        match stmt {
            Statement::ExpressionStatement(expr_stmt) => {
                if let Expression::CallExpression(call) = &expr_stmt.expression {
                    if let (Expression::Identifier(callee), Some(Argument::StringLiteral(lit))) =
                        (&call.callee, call.arguments.first())
                    {
                        analysis.calls.push(StringCall {
                            callee: callee.name.to_string(),
                            argument: lit.value.to_string(),
                        });
                    }
                }
            }
            Statement::ExportDefaultDeclaration(decl) => {
                if let ExportDefaultDeclarationKind::ObjectExpression(obj) = &decl.declaration {
                    let mut entries = BTreeMap::new();
                    for prop in &obj.properties {
                        if let ObjectPropertyKind::ObjectProperty(p) = prop {
                            if let (Some(key), Expression::StringLiteral(value)) =
                                (p.key.static_name(), &p.value)
                            {
                                entries.insert(key.to_string(), value.value.to_string());
                            }
                        }
                    }
                    analysis.default_export = Some(entries);
                }
            }
            _ => {}
        }
    }

    Ok(analysis)
}

fn extract_from_statement(stmt: &Statement, imports: &mut Vec<ImportInfo>) {
    match stmt {
        Statement::ImportDeclaration(decl) => {
            if decl.import_kind.is_type() {
                return;
            }
            let kind = if decl.specifiers.as_ref().map_or(true, |s| s.is_empty()) {
                ImportKind::SideEffect
            } else {
                ImportKind::Static
            };
            imports.push(ImportInfo { source: decl.source.value.to_string(), kind });
        }
        Statement::ExportNamedDeclaration(decl) => {
            if let Some(source) = &decl.source {
                imports.push(ImportInfo {
                    source: source.value.to_string(),
                    kind: ImportKind::ExportFrom,
                });
            }
        }
        Statement::ExportAllDeclaration(decl) => {
            imports.push(ImportInfo {
                source: decl.source.value.to_string(),
                kind: ImportKind::ExportStar,
            });
        }
        Statement::ExpressionStatement(expr_stmt) => {
            extract_from_expression(&expr_stmt.expression, imports);
        }
        Statement::VariableDeclaration(var_decl) => {
            for decl in &var_decl.declarations {
                if let Some(init) = &decl.init {
                    extract_from_expression(init, imports);
                }
            }
        }
        Statement::BlockStatement(block) => {
            for stmt in &block.body {
                extract_from_statement(stmt, imports);
            }
        }
        Statement::IfStatement(if_stmt) => {
            extract_from_statement(&if_stmt.consequent, imports);
            if let Some(alt) = &if_stmt.alternate {
                extract_from_statement(alt, imports);
            }
        }
        Statement::FunctionDeclaration(func) => {
            if let Some(body) = &func.body {
                for stmt in &body.statements {
                    extract_from_statement(stmt, imports);
                }
            }
        }
        _ => {}
    }
}

fn extract_from_expression(expr: &Expression, imports: &mut Vec<ImportInfo>) {
    match expr {
        Expression::ImportExpression(import_expr) => {
            if let Expression::StringLiteral(lit) = &import_expr.source {
                imports.push(ImportInfo { source: lit.value.to_string(), kind: ImportKind::Dynamic });
            }
        }
        Expression::CallExpression(call) => {
            if let Expression::Identifier(ident) = &call.callee {
                if ident.name == "require" {
                    if let Some(Argument::StringLiteral(lit)) = call.arguments.first() {
                        imports.push(ImportInfo {
                            source: lit.value.to_string(),
                            kind: ImportKind::Require,
                        });
                    }
                }
            }
            for arg in &call.arguments {
                if let Some(expr) = arg.as_expression() {
                    extract_from_expression(expr, imports);
                }
            }
        }
        Expression::AwaitExpression(await_expr) => {
            extract_from_expression(&await_expr.argument, imports);
        }
        Expression::ArrowFunctionExpression(arrow) => {
            for stmt in &arrow.body.statements {
                extract_from_statement(stmt, imports);
            }
        }
        Expression::ParenthesizedExpression(paren) => {
            extract_from_expression(&paren.expression, imports);
        }
        _ => {}
    }
}
