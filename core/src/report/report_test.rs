use super::*;
use crate::decl::DeclarationCollector;
use crate::diag::{Builtins, DiagnosticEngine, DiagnosticKind};
use crate::scan::BlockScanner;
use crate::token::Tokenizer;

fn report(src: &str) -> StructuralReport {
    let tokens = Tokenizer::tokenize(src);
    let blocks = BlockScanner::scan(&tokens, src);
    let decls = DeclarationCollector::collect(&tokens, &blocks);
    let builtins = Builtins::default();
    let diags = DiagnosticEngine::new(&tokens, &blocks, &decls, &builtins).run();
    StructuralReport::assemble(blocks, decls, diags)
}

const SAMPLE: &str = r#"' Totals helper
Dim count As Integer
Function Add(a As Integer, b As Integer) As Integer
    Add = a + b
End Function
Sub Show(msg As String)
    On Error Resume Next
    For i = 1 To 3
        If i > 1 Then
            MsgBox msg
        End If
    Next i
End Sub
"#;

#[test]
fn test_constructs_are_grouped_by_kind() {
    let r = report(SAMPLE);
    assert_eq!(r.comments.len(), 1);
    assert_eq!(r.variables.len(), 1);
    assert_eq!(r.functions.len(), 1);
    assert_eq!(r.subroutines.len(), 1);
    assert_eq!(r.loops.len(), 1);
    assert_eq!(r.conditionals.len(), 1);
    assert_eq!(r.error_handling.len(), 1);
    assert!(r.classes.is_empty());
    assert!(r.properties.is_empty());
    assert!(!r.option_explicit);
}

#[test]
fn test_diagnostics_sorted_by_position() {
    // The unterminated For (line 3) is raised by the scanner before the undeclared
    // use on line 1 and the unused declaration on line 2.
    let r = report("x = 1\nDim y\nFor j = 1 To 2\n");
    let positions: Vec<(u32, u32)> = r.diagnostics.iter().map(|d| (d.line, d.column)).collect();
    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);
    assert!(matches!(r.diagnostics[0].kind, DiagnosticKind::UndeclaredVariableUse(_)));
    assert!(matches!(r.diagnostics[1].kind, DiagnosticKind::UnusedDeclaration(_)));
    assert!(r.has_errors());
    assert_eq!(r.error_count(), 1);
}

#[test]
fn test_json_field_names() {
    let r = report(SAMPLE);
    let value: serde_json::Value = serde_json::from_str(&r.to_json(true).unwrap()).unwrap();
    let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
    for key in [
        "comments",
        "variables",
        "functions",
        "subroutines",
        "properties",
        "loops",
        "conditionals",
        "errorHandling",
        "classes",
        "diagnostics",
        "unmatchedSummary",
        "optionExplicit",
    ] {
        assert!(keys.contains(&key), "missing {key}");
    }
    let add = &value["functions"][0];
    assert_eq!(add["name"], "Add");
    assert_eq!(add["kind"], "Function");
    assert_eq!(add["returnType"], "Integer");
    assert_eq!(value["variables"][0]["declaredType"], "Integer");
    assert_eq!(value["variables"][0]["owningConstructId"], serde_json::Value::Null);
    assert_eq!(value["diagnostics"][0]["kind"]["type"], "unusedDeclaration");
}

#[test]
fn test_compact_json_is_single_line() {
    let r = report(SAMPLE);
    assert!(!r.to_json(true).unwrap().contains('\n'));
    assert!(r.to_json(false).unwrap().contains('\n'));
}

#[test]
fn test_yaml_rendering() {
    let yaml = report(SAMPLE).render(ReportFormat::Yaml, false).unwrap();
    assert!(yaml.contains("errorHandling:"));
    assert!(yaml.contains("name: Add"));
}

#[test]
fn test_text_rendering() {
    let text = report(SAMPLE).render_text();
    assert!(text.starts_with("The VBA script contains the following components:"));
    assert!(text.contains("**Comments:**\n- Totals helper"));
    assert!(text.contains("- Variable 'count' of type 'Integer'"));
    assert!(text.contains("- Function 'Add' with parameters 'a As Integer, b As Integer' returning 'Integer'"));
    assert!(text.contains("  Function Body: Add = a + b"));
    assert!(text.contains("- Subroutine 'Show' with parameters 'msg As String'"));
    assert!(text.contains("- Loop: For i = 1 To 3"));
    assert!(text.contains("- Conditional: If i > 1 Then"));
    assert!(text.contains("- Error Handling: On Error Resume Next"));
    assert!(text.contains("**Errors Detected:**"));
    assert!(!text.contains("**Classes:**"));
}
