use super::*;
use crate::diag::{DiagnosticKind, Severity};
use crate::scan::{BlockKind, LoopKind};

fn unused_names(report: &StructuralReport) -> Vec<&str> {
    report
        .diagnostics
        .iter()
        .filter_map(|d| match &d.kind {
            DiagnosticKind::UnusedDeclaration(name) => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

fn undeclared_names(report: &StructuralReport) -> Vec<&str> {
    report
        .diagnostics
        .iter()
        .filter_map(|d| match &d.kind {
            DiagnosticKind::UndeclaredVariableUse(name) => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

fn unmatched_count(report: &StructuralReport) -> usize {
    report
        .diagnostics
        .iter()
        .filter(|d| matches!(d.kind, DiagnosticKind::UnmatchedBlock(_)))
        .count()
}

const MIXED_MODULE: &str = r#"' This is a comment
Dim count As Integer
Dim unusedVar As String

Function AddNumbers(a As Integer, b As Integer) As Integer
    Dim result As Integer
    result = a + b
    AddNumbers = result
End Function

Sub ShowMessage(msg As String)
    MsgBox msg
End Sub

Sub LoopExample()
    Dim i As Integer
    For i = 1 To 10
        MsgBox i
Next i

Sub ConditionalExample(x As Integer)
    If x > 0 Then
        MsgBox "Positive"
    Else
        MsgBox "Non-positive"
    ' Missing End If here

Sub ErrorExample()
    On Error Resume Next
    Dim x As Integer
    x = 1 / 0
    If Err.Number <> 0 Then
        MsgBox "Error occurred"
    End If
End Sub

Class MyClass
    Private x As Integer
    Public Property Get Value() As Integer
        Value = x
    End Property
    Public Property Let Value(newValue As Integer)
        x = newValue
    End Property
End Class

' Use of undeclared variable
total = AddNumbers(5, 10)
"#;

#[test]
fn test_add_function_scenario() {
    let src = "Dim count As Integer\nFunction Add(a As Integer, b As Integer) As Integer\n    Add = a + b\nEnd Function\n";
    let report = analyze(src).unwrap();
    assert_eq!(report.variables.len(), 1);
    assert_eq!(report.variables[0].name, "count");
    assert_eq!(report.variables[0].declared_type, "Integer");
    assert_eq!(report.functions.len(), 1);
    assert_eq!(report.functions[0].name.as_deref(), Some("Add"));
    assert!(report.functions[0].end.is_some());
    assert_eq!(unmatched_count(&report), 0);
    assert_eq!(unused_names(&report), vec!["count"]);
    assert!(undeclared_names(&report).is_empty());
}

#[test]
fn test_unterminated_conditional_scenario() {
    let report = analyze("If x > 0 Then").unwrap();
    assert_eq!(report.conditionals.len(), 1);
    assert!(report.conditionals[0].end.is_none());
    assert_eq!(unmatched_count(&report), 1);
    assert_eq!(report.unmatched_summary.get("If"), Some(&1));
}

#[test]
fn test_unmatched_for_is_reported_once() {
    let report = analyze("Sub S()\n    Dim i As Integer\n    For i = 1 To 3\n        MsgBox i\nEnd Sub\n").unwrap();
    assert_eq!(report.loops.len(), 1);
    assert!(report.loops[0].end.is_none());
    let for_diags: Vec<_> = report
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnmatchedBlock(BlockKind::Loop(LoopKind::For)))
        .collect();
    assert_eq!(for_diags.len(), 1);
    assert!(report.subroutines[0].end.is_some());
}

#[test]
fn test_analysis_is_deterministic() {
    let first = analyze(MIXED_MODULE).unwrap();
    let second = analyze(MIXED_MODULE).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json(false).unwrap(), second.to_json(false).unwrap());
}

#[test]
fn test_balanced_input_has_no_unmatched_blocks() {
    let src = "Sub S()\n    Do\n        While False\n        Wend\n    Loop\n    If True Then\n    End If\nEnd Sub\n";
    let report = analyze(src).unwrap();
    assert_eq!(unmatched_count(&report), 0);
    assert!(report.unmatched_summary.is_empty());
}

#[test]
fn test_undeclared_use_counted_once() {
    let report = analyze("z = 1\nz = 2\nz = 3\nz = 4\nMsgBox z\n").unwrap();
    assert_eq!(undeclared_names(&report), vec!["z"]);
}

#[test]
fn test_mixed_module() {
    let report = analyze(MIXED_MODULE).unwrap();
    assert_eq!(report.comments.len(), 3);
    assert_eq!(report.functions.len(), 1);
    assert_eq!(report.subroutines.len(), 4);
    assert_eq!(report.properties.len(), 2);
    assert_eq!(report.loops.len(), 1);
    assert_eq!(report.conditionals.len(), 2);
    assert_eq!(report.error_handling.len(), 1);
    assert_eq!(report.classes.len(), 1);

    assert_eq!(unused_names(&report), vec!["count", "unusedVar"]);
    assert_eq!(undeclared_names(&report), vec!["total"]);
    // ConditionalExample's If, ConditionalExample, and LoopExample never close.
    assert_eq!(report.unmatched_summary.get("If"), Some(&1));
    assert_eq!(report.unmatched_summary.get("Sub"), Some(&2));
    assert_eq!(unmatched_count(&report), 3);

    let handler = &report.error_handling[0];
    assert_eq!(handler.header.as_deref(), Some("Resume Next"));
    assert!(handler.end.is_some());
}

#[test]
fn test_empty_input_is_rejected() {
    assert_eq!(analyze(""), Err(AnalysisError::EmptyInput));
    assert_eq!(analyze("  \n\t\n"), Err(AnalysisError::EmptyInput));
}

#[test]
fn test_oversized_input_is_rejected() {
    let analyzer = Analyzer::new(AnalyzerConfig {
        max_input_bytes: 8,
        ..Default::default()
    });
    let err = analyzer.analyze("Dim x As Integer").unwrap_err();
    assert_eq!(err, AnalysisError::InputTooLarge { size: 16, limit: 8 });
    assert!(err.to_string().contains("16 bytes"));
    assert!(analyzer.analyze("Dim x").is_ok());
}

#[test]
fn test_configured_builtins_and_strictness() {
    let analyzer = Analyzer::new(AnalyzerConfig {
        extra_builtins: vec!["Sheet1".to_string()],
        strict_undeclared: true,
        ..Default::default()
    });
    let report = analyzer.analyze("Sheet1.Range(\"A1\").Value = total\n").unwrap();
    assert_eq!(undeclared_names(&report), vec!["total"]);
    assert_eq!(report.diagnostics[0].severity, Severity::Error);
    assert!(report.has_errors());
}

#[test]
fn test_analyzer_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Analyzer>();
}

#[test]
fn test_config_is_kept_as_given() {
    let config = AnalyzerConfig {
        strict_undeclared: true,
        extra_builtins: vec!["Sheet1".to_string()],
        ..Default::default()
    };
    let analyzer = Analyzer::new(config.clone());
    assert_eq!(analyzer.config(), &config);
}
