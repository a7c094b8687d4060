use crate::util::fast_map::{FastHashSet, fast_hash_set_new};
use once_cell::sync::Lazy;

/// Names VBA and the Office object model provide without a declaration. Stored
/// lowercase; lookups are case-insensitive.
const BUILTIN_NAMES: &[&str] = &[
    // statements and clauses that lex as identifiers
    "select", "case", "with", "redim", "preserve", "declare", "ptrsafe", "lib", "alias", "type", "enum",
    "event", "raiseevent", "implements", "withevents", "erase", "lset", "rset", "open", "close",
    "write", "put", "seek", "print", "stop", "attribute", "like", "eqv", "imp", "typeof",
    "addressof", "me",
    // values
    "true", "false", "nothing", "empty", "null",
    // type names
    "boolean", "byte", "integer", "long", "longlong", "longptr", "single", "double", "currency",
    "date", "string", "variant", "object", "decimal", "any", "collection",
    // conversion
    "cbool", "cbyte", "ccur", "cdate", "cdbl", "cdec", "cint", "clng", "clnglng", "clngptr",
    "csng", "cstr", "cvar", "cverr", "val", "str", "hex", "oct", "fix", "int",
    // string
    "asc", "ascw", "chr", "chrw", "format", "instr", "instrrev", "lcase", "ucase", "left",
    "right", "mid", "len", "lenb", "ltrim", "rtrim", "trim", "replace", "space", "split", "join",
    "strcomp", "strconv", "strreverse", "filter",
    // math
    "abs", "atn", "cos", "exp", "log", "rnd", "randomize", "round", "sgn", "sin", "sqr", "tan",
    // date and time
    "now", "time", "timer", "day", "month", "year", "hour", "minute", "second", "weekday",
    "dateadd", "datediff", "datepart", "dateserial", "datevalue", "timeserial", "timevalue",
    "monthname", "weekdayname",
    // arrays and inspection
    "array", "lbound", "ubound", "isarray", "isdate", "isempty", "iserror", "ismissing",
    "isnull", "isnumeric", "isobject", "typename", "vartype", "iif", "choose", "switch",
    // interaction
    "msgbox", "inputbox", "doevents", "shell", "environ", "beep", "sendkeys", "appactivate",
    "createobject", "getobject", "callbyname", "dir", "kill", "filecopy", "filelen",
    "freefile", "eof", "lof", "mkdir", "rmdir", "chdir", "curdir",
    // objects
    "err", "debug", "vba", "application", "activeworkbook", "activesheet", "activecell",
    "thisworkbook", "workbooks", "worksheets", "sheets", "range", "cells", "rows", "columns",
    "selection", "worksheetfunction", "userform", "controls",
    // constants
    "vbcrlf", "vbcr", "vblf", "vbnewline", "vbtab", "vbnullstring", "vbnullchar", "vbokonly",
    "vbokcancel", "vbyesno", "vbyesnocancel", "vbyes", "vbno", "vbok", "vbcancel",
    "vbcritical", "vbquestion", "vbexclamation", "vbinformation", "vbobjecterror",
    "vbbinarycompare", "vbtextcompare", "vbtrue", "vbfalse", "vbempty", "vbnull", "vbinteger",
    "vblong", "vbstring", "vbdate", "vbarray", "vbobject", "vbvariant", "xlup", "xldown",
    "xltoleft", "xltoright",
];

static BUILTINS: Lazy<FastHashSet<&'static str>> = Lazy::new(|| {
    let mut set = fast_hash_set_new();
    set.extend(BUILTIN_NAMES.iter().copied());
    set
});

/// The built-in allow-list plus any names added through configuration.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    extra: FastHashSet<String>,
}

impl Builtins {
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra: extra.into_iter().map(|s| s.as_ref().to_ascii_lowercase()).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        let lower = name.to_ascii_lowercase();
        let bare = lower.trim_end_matches(['$', '%', '&', '!', '#', '@']);
        BUILTINS.contains(bare) || self.extra.contains(&lower) || self.extra.contains(bare)
    }
}
