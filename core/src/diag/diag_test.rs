use super::*;
use crate::decl::DeclarationCollector;
use crate::scan::{BlockKind, BlockScanner, LoopKind};
use crate::token::Tokenizer;

fn diagnose_with(src: &str, builtins: &Builtins, strict: bool) -> DiagnosticSet {
    let tokens = Tokenizer::tokenize(src);
    let blocks = BlockScanner::scan(&tokens, src);
    let decls = DeclarationCollector::collect(&tokens, &blocks);
    DiagnosticEngine::new(&tokens, &blocks, &decls, builtins)
        .strict(strict)
        .run()
}

fn diagnose(src: &str) -> DiagnosticSet {
    diagnose_with(src, &Builtins::default(), false)
}

fn undeclared(set: &DiagnosticSet) -> Vec<&str> {
    set.diagnostics
        .iter()
        .filter_map(|d| match &d.kind {
            DiagnosticKind::UndeclaredVariableUse(name) => Some(name.as_str()),
            _ => None,
        })
        .collect()
}

fn unused(set: &DiagnosticSet) -> Vec<(&str, u32)> {
    set.diagnostics
        .iter()
        .filter_map(|d| match &d.kind {
            DiagnosticKind::UnusedDeclaration(name) => Some((name.as_str(), d.line)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_add_function_scenario() {
    let src = "Dim count As Integer\nFunction Add(a As Integer, b As Integer) As Integer\n    Add = a + b\nEnd Function\n";
    let set = diagnose(src);
    assert!(undeclared(&set).is_empty(), "{:?}", set.diagnostics);
    assert_eq!(unused(&set), vec![("count", 1)]);
    assert!(set.unmatched_summary.is_empty());
    let count = &set.diagnostics[0];
    assert_eq!(count.severity, Severity::Warning);
    assert_eq!(count.related_name.as_deref(), Some("count"));
}

#[test]
fn test_used_declaration_is_not_flagged() {
    let set = diagnose("Dim y As Integer\ny = 1\n");
    assert!(set.diagnostics.is_empty(), "{:?}", set.diagnostics);
}

#[test]
fn test_undeclared_name_is_reported_once() {
    let src = "z = 1\nz = z + 1\nMsgBox z\nz = 0: MsgBox z\n";
    let set = diagnose(src);
    assert_eq!(undeclared(&set), vec!["z"]);
    let diag = &set.diagnostics[0];
    assert_eq!((diag.line, diag.column), (1, 1));
}

#[test]
fn test_undeclared_order_is_first_occurrence() {
    let set = diagnose("b = 1\na = 2\nB = 3\n");
    assert_eq!(undeclared(&set), vec!["b", "a"]);
}

#[test]
fn test_names_match_case_insensitively() {
    let set = diagnose("Dim Total As Long\ntotal = TOTAL + 1\n");
    assert!(set.diagnostics.is_empty(), "{:?}", set.diagnostics);
}

#[test]
fn test_option_explicit_raises_severity() {
    let relaxed = diagnose("x = 1\n");
    assert_eq!(relaxed.diagnostics[0].severity, Severity::Warning);

    let explicit = diagnose("Option Explicit\nx = 1\n");
    assert_eq!(explicit.diagnostics[0].severity, Severity::Error);

    let strict = diagnose_with("x = 1\n", &Builtins::default(), true);
    assert!(strict.diagnostics[0].is_error());
}

#[test]
fn test_builtins_and_configured_extras() {
    let src = "MsgBox Len(Left$(\"abc\", 2)) & vbCrLf\nRange(\"A1\").Value = Now\n";
    assert!(diagnose(src).diagnostics.is_empty());

    let with_default = diagnose("Sheet1.Activate\n");
    assert_eq!(undeclared(&with_default), vec!["Sheet1"]);

    let extras = Builtins::new(["sheet1"]);
    assert!(diagnose_with("SHEET1.Activate\n", &extras, false).diagnostics.is_empty());
}

#[test]
fn test_non_variable_positions_are_skipped() {
    let src = r#"Sub S()
    Dim c As Collection
    Dim d As New Scripting.Dictionary
    On Error GoTo Handler
    c.Add d.Count
    MsgBox Prompt:="done", Title:="S"
    Exit Sub
Handler:
    Resume Cleanup
Cleanup:
End Sub
"#;
    let set = diagnose(src);
    assert!(undeclared(&set).is_empty(), "{:?}", set.diagnostics);
    assert!(unused(&set).is_empty(), "{:?}", set.diagnostics);
}

#[test]
fn test_redeclared_name_leaves_other_declaration_flagged() {
    let set = diagnose("Dim x As Integer\nDim x As Long\nx = 1\n");
    assert_eq!(unused(&set), vec![("x", 1)]);
}

#[test]
fn test_local_declaration_shadows_module_level() {
    let src = "Dim n As Long\nSub S()\n    Dim n As Long\n    n = 1\nEnd Sub\n";
    assert_eq!(unused(&diagnose(src)), vec![("n", 1)]);
}

#[test]
fn test_module_level_use_goes_to_module_declaration() {
    let src = "Dim n As Long\nSub S()\n    Dim n As Long\nEnd Sub\nn = 2\n";
    assert_eq!(unused(&diagnose(src)), vec![("n", 3)]);
}

#[test]
fn test_innermost_owner_wins() {
    let src = "Sub S()\n    Dim i As Long\n    For j = 1 To 2\n        Dim i As Long\n        i = j\n    Next\nEnd Sub\n";
    let set = diagnose(src);
    assert_eq!(unused(&set), vec![("i", 2)]);
    assert_eq!(undeclared(&set), vec!["j"]);
}

#[test]
fn test_type_names_are_not_uses() {
    assert_eq!(unused(&diagnose("Dim item As Item\n")), vec![("item", 1)]);
    assert_eq!(unused(&diagnose("Dim collection As Collection\n")), vec![("collection", 1)]);

    let src = "Dim item As Long\nFunction F() As Item\nEnd Function\n";
    assert_eq!(unused(&diagnose(src)), vec![("item", 1)]);

    let src = "Dim dictionary As Object\nSet x = New Scripting.Dictionary\n";
    assert_eq!(unused(&diagnose(src)), vec![("dictionary", 1)]);
}

#[test]
fn test_declaring_statement_is_not_a_use() {
    let set = diagnose("Const Limit As Long = 10, Half As Long = Limit / 2\n");
    assert_eq!(unused(&set), vec![("Limit", 1), ("Half", 1)]);
}

#[test]
fn test_locals_are_scoped_to_their_procedure() {
    let src = r#"Dim x As Long
Sub S()
    For i = 1 To 2
        Dim x As Long
    Next
    x = 5
End Sub
"#;
    assert_eq!(unused(&diagnose(src)), vec![("x", 1)]);

    let src = r#"Sub A()
    For i = 1 To 2
        Dim t As Long
    Next
End Sub
Sub B()
    Dim t As Long
    If True Then
        t = 1
    End If
End Sub
"#;
    assert_eq!(unused(&diagnose(src)), vec![("t", 3)]);
}

#[test]
fn test_enum_members_and_type_fields_are_known() {
    let src = r#"Private Enum Color
    Red
    Green = 2
End Enum
Private Type Pt
    px As Long
End Type
Private Declare PtrSafe Function GetWindow Lib "user32" (ByVal hwnd As LongPtr, ByVal cmd As Long) As LongPtr
Dim c As Color
c = Red
"#;
    let set = diagnose(src);
    assert!(undeclared(&set).is_empty(), "{:?}", set.diagnostics);
    assert!(unused(&set).is_empty(), "{:?}", set.diagnostics);

    // Statements after `End Enum` are ordinary code again.
    let set = diagnose("Private Enum E\n    A\nEnd Enum\nB = A\n");
    assert_eq!(undeclared(&set), vec!["B"]);
}

#[test]
fn test_declared_externals_are_known() {
    let src = "Private Declare Function GetTickCount Lib \"kernel32\" () As Long\nPrivate Type Point\nEnd Type\nDim p As Point\np = GetTickCount()\n";
    let set = diagnose(src);
    assert!(undeclared(&set).is_empty(), "{:?}", set.diagnostics);
}

#[test]
fn test_unmatched_summary_counts_per_kind() {
    let set = diagnose("For i = 1 To 2\nFor j = 1 To 2\nIf i Then\n");
    assert_eq!(set.unmatched_summary.get(BlockKind::Loop(LoopKind::For).as_str()), Some(&2));
    assert_eq!(set.unmatched_summary.get("If"), Some(&1));
    let unmatched = set
        .diagnostics
        .iter()
        .filter(|d| matches!(d.kind, DiagnosticKind::UnmatchedBlock(_)))
        .count();
    assert_eq!(unmatched, 3);
}
