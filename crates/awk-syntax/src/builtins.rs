//! Static descriptions of the AWK built-in functions and variables.
//!
//! Entries with `awk: false` are gawk extensions: invisible to hover and
//! signature help in strict POSIX mode, flagged by the compatibility
//! warning when referenced there.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Function,
    Variable,
}

#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub kind: BuiltinKind,
    pub parameters: &'static [&'static str],
    /// Index of the first optional parameter, if any may be omitted.
    pub first_optional: Option<usize>,
    /// Accepts further arguments past the named parameters.
    pub variadic: bool,
    /// Available in strict POSIX mode. Gawk mode sees every entry.
    pub awk: bool,
    pub description: &'static str,
}

const fn func(
    name: &'static str,
    parameters: &'static [&'static str],
    first_optional: Option<usize>,
    awk: bool,
    description: &'static str,
) -> Builtin {
    Builtin {
        name,
        kind: BuiltinKind::Function,
        parameters,
        first_optional,
        variadic: false,
        awk,
        description,
    }
}

const fn var(name: &'static str, awk: bool, description: &'static str) -> Builtin {
    Builtin {
        name,
        kind: BuiltinKind::Variable,
        parameters: &[],
        first_optional: None,
        variadic: false,
        awk,
        description,
    }
}

pub static BUILTINS: &[Builtin] = &[
    // Arithmetic functions
    func("atan2", &["y", "x"], None, true, "Arctangent of y/x in radians."),
    func("cos", &["x"], None, true, "Cosine of x, with x in radians."),
    func("exp", &["x"], None, true, "Exponential of x (e ^ x)."),
    func("int", &["x"], None, true, "Truncate x toward zero to an integer."),
    func("log", &["x"], None, true, "Natural logarithm of x."),
    func("rand", &[], None, true, "Random number between 0 and 1."),
    func("sin", &["x"], None, true, "Sine of x, with x in radians."),
    func("sqrt", &["x"], None, true, "Positive square root of x."),
    func(
        "srand",
        &["seed"],
        Some(0),
        true,
        "Seed the random number generator; returns the previous seed. Uses the time of day when seed is omitted.",
    ),
    // String functions
    func(
        "gsub",
        &["regexp", "replacement", "target"],
        Some(2),
        true,
        "Globally substitute replacement for every match of regexp in target ($0 when omitted); returns the number of substitutions.",
    ),
    func(
        "index",
        &["string", "find"],
        None,
        true,
        "Position of the first occurrence of find in string, or 0 if absent.",
    ),
    func(
        "length",
        &["string"],
        Some(0),
        true,
        "Length of string in characters, or of $0 when called without an argument.",
    ),
    func(
        "match",
        &["string", "regexp"],
        None,
        true,
        "Position of the longest leftmost match of regexp in string; sets RSTART and RLENGTH.",
    ),
    func(
        "split",
        &["string", "array", "fieldsep"],
        Some(2),
        true,
        "Split string into array on fieldsep (FS when omitted); returns the number of elements.",
    ),
    Builtin {
        name: "sprintf",
        kind: BuiltinKind::Function,
        parameters: &["format"],
        first_optional: None,
        variadic: true,
        awk: true,
        description: "Format expressions according to the printf-style format string and return the result.",
    },
    func(
        "sub",
        &["regexp", "replacement", "target"],
        Some(2),
        true,
        "Substitute replacement for the first match of regexp in target ($0 when omitted); returns 0 or 1.",
    ),
    func(
        "substr",
        &["string", "start", "length"],
        Some(2),
        true,
        "Substring of string starting at position start (1-based), at most length characters long.",
    ),
    func("tolower", &["string"], None, true, "Copy of string with uppercase letters folded to lowercase."),
    func("toupper", &["string"], None, true, "Copy of string with lowercase letters folded to uppercase."),
    // I/O and process functions
    func(
        "close",
        &["file"],
        None,
        true,
        "Close an open file or command; returns 0 on success.",
    ),
    func(
        "fflush",
        &["file"],
        Some(0),
        true,
        "Flush buffered output for file, or for every open output file when omitted.",
    ),
    func("system", &["command"], None, true, "Run command through the shell and return its exit status."),
    // Gawk extension functions
    func(
        "gensub",
        &["regexp", "replacement", "how", "target"],
        Some(3),
        false,
        "General substitution: replace the how-th match (or all with \"g\") of regexp in target and return the result, leaving the original untouched.",
    ),
    func(
        "patsplit",
        &["string", "array", "fieldpat", "seps"],
        Some(2),
        false,
        "Split string into array by the pieces matching fieldpat (FPAT when omitted), storing separators in seps.",
    ),
    func("strtonum", &["string"], None, false, "Numeric value of string, honoring octal and hexadecimal prefixes."),
    func(
        "asort",
        &["source", "dest"],
        Some(1),
        false,
        "Sort the values of source (into dest when given) and return the element count.",
    ),
    func(
        "asorti",
        &["source", "dest"],
        Some(1),
        false,
        "Sort the indices of source (into dest when given) and return the element count.",
    ),
    func("mktime", &["datespec"], None, false, "Timestamp for a \"YYYY MM DD HH MM SS\" datespec, or -1 when invalid."),
    func(
        "strftime",
        &["format", "timestamp", "utc-flag"],
        Some(0),
        false,
        "Format a timestamp (now when omitted) according to the strftime format string.",
    ),
    func("systime", &[], None, false, "Current time of day as seconds since the epoch."),
    Builtin {
        name: "and",
        kind: BuiltinKind::Function,
        parameters: &["v1", "v2"],
        first_optional: None,
        variadic: true,
        awk: false,
        description: "Bitwise AND of two or more integer arguments.",
    },
    Builtin {
        name: "or",
        kind: BuiltinKind::Function,
        parameters: &["v1", "v2"],
        first_optional: None,
        variadic: true,
        awk: false,
        description: "Bitwise OR of two or more integer arguments.",
    },
    Builtin {
        name: "xor",
        kind: BuiltinKind::Function,
        parameters: &["v1", "v2"],
        first_optional: None,
        variadic: true,
        awk: false,
        description: "Bitwise XOR of two or more integer arguments.",
    },
    func("compl", &["val"], None, false, "Bitwise complement of val."),
    func("lshift", &["val", "count"], None, false, "val shifted left by count bits."),
    func("rshift", &["val", "count"], None, false, "val shifted right by count bits."),
    func("isarray", &["x"], None, false, "1 if x is an array, 0 otherwise."),
    func("typeof", &["x"], None, false, "Type of x: \"array\", \"number\", \"string\", \"strnum\", \"unassigned\", or \"untyped\"."),
    // POSIX variables
    var("ARGC", true, "Count of command-line arguments."),
    var("ARGV", true, "Array of command-line arguments, indexed from 0 to ARGC - 1."),
    var("CONVFMT", true, "printf format for converting numbers to strings (default \"%.6g\")."),
    var("ENVIRON", true, "Array of environment variables, indexed by name."),
    var("FILENAME", true, "Name of the current input file."),
    var("FNR", true, "Record number in the current input file."),
    var("FS", true, "Input field separator (default a single space)."),
    var("NF", true, "Number of fields in the current record."),
    var("NR", true, "Number of input records read so far."),
    var("OFMT", true, "printf format for printing numbers (default \"%.6g\")."),
    var("OFS", true, "Output field separator (default a single space)."),
    var("ORS", true, "Output record separator (default a newline)."),
    var("RLENGTH", true, "Length of the substring matched by match(), or -1."),
    var("RS", true, "Input record separator (default a newline)."),
    var("RSTART", true, "Start position of the substring matched by match(), or 0."),
    var("SUBSEP", true, "Separator joining multiple array subscripts (default \"\\034\")."),
    // Gawk extension variables
    var("BINMODE", false, "Binary-mode I/O setting for non-POSIX systems."),
    var("ERRNO", false, "Description of the last getline or close error."),
    var("FIELDWIDTHS", false, "Space-separated list of fixed field widths, overriding FS."),
    var("FPAT", false, "Regexp describing field contents, overriding FS."),
    var("FUNCTAB", false, "Array of the names of all defined functions."),
    var("IGNORECASE", false, "When nonzero, string and regexp operations ignore case."),
    var("PROCINFO", false, "Array with information about the running gawk process."),
    var("RT", false, "Input text that matched RS for the current record."),
    var("SYMTAB", false, "Array of all global variables, indexed by name."),
    var("TEXTDOMAIN", false, "Text domain for internationalized messages."),
];

pub fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name)
}

/// True when `name` is a built-in that strict POSIX mode does not provide.
pub fn gawk_only(name: &str) -> bool {
    lookup(name).is_some_and(|builtin| !builtin.awk)
}

/// Render a display signature: `substr(string, start [, length])` for
/// functions, the bare name for variables.
pub fn signature(builtin: &Builtin) -> String {
    if builtin.kind == BuiltinKind::Variable {
        return builtin.name.to_string();
    }
    let mut out = format!("{}(", builtin.name);
    for (index, param) in builtin.parameters.iter().enumerate() {
        if Some(index) == builtin.first_optional {
            out.push_str(if index == 0 { "[" } else { " [, " });
        } else if index > 0 {
            out.push_str(", ");
        }
        out.push_str(param);
    }
    if builtin.first_optional.is_some() {
        out.push(']');
    }
    if builtin.variadic {
        if !builtin.parameters.is_empty() {
            out.push_str(", ");
        }
        out.push_str("...");
    }
    out.push(')');
    out
}
