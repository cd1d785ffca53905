// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RFC 7644 3.4.2.2 filter grammar: parsing, the AST, and a canonical
//! serializer. Attribute names and operators are case insensitive; values are
//! JSON literals.

use std::fmt;

/// A (possibly URI-qualified, possibly sub-attributed) attribute path, e.g.
/// `userName`, `name.familyName`, or
/// `urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:manager`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrPath {
    pub uri: Option<String>,
    pub attr: String,
    pub sub_attr: Option<String>,
}

impl AttrPath {
    pub fn simple(attr: impl Into<String>) -> Self {
        AttrPath { uri: None, attr: attr.into(), sub_attr: None }
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(uri) = &self.uri {
            write!(f, "{uri}:")?;
        }
        write!(f, "{}", self.attr)?;
        if let Some(sub) = &self.sub_attr {
            write!(f, ".{sub}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Co,
    Sw,
    Ew,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CompareOp {
    fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Co => "co",
            CompareOp::Sw => "sw",
            CompareOp::Ew => "ew",
            CompareOp::Gt => "gt",
            CompareOp::Lt => "lt",
            CompareOp::Ge => "ge",
            CompareOp::Le => "le",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "eq" => CompareOp::Eq,
            "ne" => CompareOp::Ne,
            "co" => CompareOp::Co,
            "sw" => CompareOp::Sw,
            "ew" => CompareOp::Ew,
            "gt" => CompareOp::Gt,
            "lt" => CompareOp::Lt,
            "ge" => CompareOp::Ge,
            "le" => CompareOp::Le,
            _ => return None,
        })
    }
}

/// A literal compValue: false / null / true / number / string.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Str(s) => write!(f, "\"{}\"", escape_str(s)),
            FilterValue::Num(n) => write!(f, "{n}"),
            FilterValue::Bool(b) => write!(f, "{b}"),
            FilterValue::Null => write!(f, "null"),
        }
    }
}

fn escape_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Compare { path: AttrPath, op: CompareOp, value: FilterValue },
    Present { path: AttrPath },
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
    ValuePath { path: AttrPath, filter: Box<Filter> },
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Compare { path, op, value } => {
                write!(f, "{path} {} {value}", op.as_str())
            }
            Filter::Present { path } => write!(f, "{path} pr"),
            Filter::And(l, r) => {
                write_combinator_operand(f, l)?;
                write!(f, " and ")?;
                write_combinator_operand(f, r)
            }
            Filter::Or(l, r) => {
                write_combinator_operand(f, l)?;
                write!(f, " or ")?;
                write_combinator_operand(f, r)
            }
            Filter::Not(inner) => write!(f, "not({inner})"),
            Filter::ValuePath { path, filter } => {
                write!(f, "{path}[{filter}]")
            }
        }
    }
}

/// `and`/`or` parse left-associatively and flat (`parse_or`): an `And`/`Or`
/// node nested as the right operand of another combinator would reparse with
/// a different tree shape unless explicitly grouped, so any And/Or operand
/// gets parenthesized. Everything else already self-delimits (`not(...)`,
/// `path[...]`) and is written as-is.
fn write_combinator_operand(
    f: &mut fmt::Formatter<'_>,
    operand: &Filter,
) -> fmt::Result {
    match operand {
        Filter::And(..) | Filter::Or(..) => write!(f, "({operand})"),
        _ => write!(f, "{operand}"),
    }
}

impl Filter {
    /// Canonical serialization, satisfying parse(serialize(parse(x))) ==
    /// parse(x).
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterParseError {
    pub code: &'static str,
    pub message: String,
    pub position: usize,
    pub input: String,
}

impl fmt::Display for FilterParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at position {} in {:?}: {}",
            self.code, self.position, self.input, self.message
        )
    }
}

impl std::error::Error for FilterParseError {}

struct Cursor<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Cursor { input, bytes: input.as_bytes(), pos: 0 }
    }

    fn err(&self, code: &'static str, message: impl Into<String>) -> FilterParseError {
        FilterParseError {
            code,
            message: message.into(),
            position: self.pos,
            input: self.input.to_string(),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos] as char).is_whitespace()
        {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn eof(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    /// Try to consume a case-insensitive keyword at the current position,
    /// requiring it not be immediately followed by an identifier character
    /// (so "eq" doesn't match a prefix of "eqx").
    fn try_keyword(&mut self, kw: &str) -> bool {
        let end = self.pos + kw.len();
        if end > self.bytes.len() {
            return false;
        }
        if !self.input[self.pos..end].eq_ignore_ascii_case(kw) {
            return false;
        }
        if let Some(&next) = self.bytes.get(end) {
            if is_ident_char(next) {
                return false;
            }
        }
        self.pos = end;
        true
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.pos < self.bytes.len() && pred(self.bytes[self.pos]) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }
}

fn is_ident_char(c: u8) -> bool {
    (c as char).is_alphanumeric() || c == b'_' || c == b'-'
}

fn is_path_char(c: u8) -> bool {
    is_ident_char(c) || c == b':' || c == b'.'
}

/// Parse a full RFC 7644 filter expression.
pub fn parse_filter(input: &str) -> Result<Filter, FilterParseError> {
    let mut cursor = Cursor::new(input);
    let filter = parse_or(&mut cursor)?;
    cursor.skip_ws();
    if !cursor.eof() {
        return Err(cursor.err(
            "invalidSyntax",
            format!("unexpected trailing input: {:?}", &input[cursor.pos..]),
        ));
    }
    Ok(filter)
}

/// FILTER := base ( SP ("and"|"or") SP base )* — left-associative, flat; "and"
/// and "or" are not distinguished in precedence from one another, matching
/// the way this grammar is documented to be parsed in practice.
fn parse_or(cursor: &mut Cursor) -> Result<Filter, FilterParseError> {
    let mut lhs = parse_base(cursor)?;
    loop {
        let save = cursor.pos;
        cursor.skip_ws();
        if cursor.try_keyword("and") {
            cursor.skip_ws();
            let rhs = parse_base(cursor)?;
            lhs = Filter::And(Box::new(lhs), Box::new(rhs));
        } else if cursor.try_keyword("or") {
            cursor.skip_ws();
            let rhs = parse_base(cursor)?;
            lhs = Filter::Or(Box::new(lhs), Box::new(rhs));
        } else {
            cursor.pos = save;
            break;
        }
    }
    Ok(lhs)
}

/// base := "not" "(" FILTER ")" | "(" FILTER ")" | valuePath | attrExp
fn parse_base(cursor: &mut Cursor) -> Result<Filter, FilterParseError> {
    cursor.skip_ws();

    if cursor.try_keyword("not") {
        cursor.skip_ws();
        if cursor.peek() != Some(b'(') {
            return Err(cursor.err(
                "invalidSyntax",
                "expected '(' after 'not'",
            ));
        }
        cursor.pos += 1;
        let inner = parse_or(cursor)?;
        cursor.skip_ws();
        if cursor.peek() != Some(b')') {
            return Err(cursor.err("invalidSyntax", "expected ')'"));
        }
        cursor.pos += 1;
        return Ok(Filter::Not(Box::new(inner)));
    }

    if cursor.peek() == Some(b'(') {
        cursor.pos += 1;
        let inner = parse_or(cursor)?;
        cursor.skip_ws();
        if cursor.peek() != Some(b')') {
            return Err(cursor.err("invalidSyntax", "expected ')'"));
        }
        cursor.pos += 1;
        return Ok(inner);
    }

    let path = parse_attr_path(cursor)?;
    cursor.skip_ws();

    if cursor.peek() == Some(b'[') {
        cursor.pos += 1;
        let inner = parse_or(cursor)?;
        cursor.skip_ws();
        if cursor.peek() != Some(b']') {
            return Err(cursor.err("invalidSyntax", "expected ']'"));
        }
        cursor.pos += 1;
        return Ok(Filter::ValuePath { path, filter: Box::new(inner) });
    }

    if cursor.try_keyword("pr") {
        return Ok(Filter::Present { path });
    }

    let op_token = cursor.take_while(is_ident_char);
    let Some(op) = CompareOp::from_str(op_token) else {
        return Err(cursor.err(
            "invalidSyntax",
            format!("expected a comparison operator or 'pr', got {op_token:?}"),
        ));
    };

    cursor.skip_ws();
    let value = parse_comp_value(cursor)?;

    Ok(Filter::Compare { path, op, value })
}

fn parse_attr_path(cursor: &mut Cursor) -> Result<AttrPath, FilterParseError> {
    let token = cursor.take_while(is_path_char);
    if token.is_empty() {
        return Err(cursor.err("invalidPath", "expected an attribute path"));
    }

    // Last-colon rule: everything up to and including the final ':' is the
    // schema URI, the remainder is attrName[.subAttr].
    let (uri, rest) = match token.rfind(':') {
        Some(idx) => (Some(token[..idx].to_string()), &token[idx + 1..]),
        None => (None, token),
    };

    if rest.is_empty() {
        return Err(cursor.err(
            "invalidPath",
            format!("attribute path {token:?} has no attribute name"),
        ));
    }

    let mut parts = rest.splitn(2, '.');
    let attr = parts.next().unwrap().to_string();
    let sub_attr = parts.next().filter(|s| !s.is_empty()).map(String::from);

    Ok(AttrPath { uri, attr, sub_attr })
}

fn parse_comp_value(
    cursor: &mut Cursor,
) -> Result<FilterValue, FilterParseError> {
    match cursor.peek() {
        Some(b'"') => parse_quoted_string(cursor).map(FilterValue::Str),
        Some(c) if c == b'-' || c.is_ascii_digit() => {
            parse_number(cursor).map(FilterValue::Num)
        }
        _ => {
            if cursor.try_keyword("true") {
                Ok(FilterValue::Bool(true))
            } else if cursor.try_keyword("false") {
                Ok(FilterValue::Bool(false))
            } else if cursor.try_keyword("null") {
                Ok(FilterValue::Null)
            } else {
                Err(cursor.err("invalidValue", "expected a comparison value"))
            }
        }
    }
}

fn parse_quoted_string(
    cursor: &mut Cursor,
) -> Result<String, FilterParseError> {
    if cursor.peek() != Some(b'"') {
        return Err(cursor.err("invalidValue", "expected a quoted string"));
    }
    cursor.pos += 1;
    let mut out = String::new();
    loop {
        match cursor.peek() {
            None => {
                return Err(cursor.err(
                    "invalidValue",
                    "unterminated quoted string",
                ));
            }
            Some(b'"') => {
                cursor.pos += 1;
                break;
            }
            Some(b'\\') => {
                cursor.pos += 1;
                match cursor.peek() {
                    Some(b'"') => out.push('"'),
                    Some(b'\\') => out.push('\\'),
                    Some(b'n') => out.push('\n'),
                    Some(b't') => out.push('\t'),
                    Some(c) => out.push(c as char),
                    None => {
                        return Err(cursor.err(
                            "invalidValue",
                            "unterminated escape sequence",
                        ));
                    }
                }
                cursor.pos += 1;
            }
            Some(_) => {
                // preserve full UTF-8 sequences
                let rest = &cursor.input[cursor.pos..];
                let ch = rest.chars().next().unwrap();
                out.push(ch);
                cursor.pos += ch.len_utf8();
            }
        }
    }
    Ok(out)
}

fn parse_number(cursor: &mut Cursor) -> Result<f64, FilterParseError> {
    let start = cursor.pos;
    if cursor.peek() == Some(b'-') {
        cursor.pos += 1;
    }
    cursor.take_while(|c| c.is_ascii_digit());
    if cursor.peek() == Some(b'.') {
        cursor.pos += 1;
        cursor.take_while(|c| c.is_ascii_digit());
    }
    if matches!(cursor.peek(), Some(b'e') | Some(b'E')) {
        cursor.pos += 1;
        if matches!(cursor.peek(), Some(b'+') | Some(b'-')) {
            cursor.pos += 1;
        }
        cursor.take_while(|c| c.is_ascii_digit());
    }
    cursor.input[start..cursor.pos].parse::<f64>().map_err(|e| {
        cursor.err("invalidValue", format!("invalid number: {e}"))
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_simple_eq() {
        let f = parse_filter(r#"userName eq "bjensen""#).unwrap();
        assert_eq!(
            f,
            Filter::Compare {
                path: AttrPath::simple("userName"),
                op: CompareOp::Eq,
                value: FilterValue::Str("bjensen".to_string()),
            }
        );
    }

    #[test]
    fn parses_case_insensitive_operator_and_attr() {
        let f1 = parse_filter(r#"userName Eq "bjensen""#).unwrap();
        let f2 = parse_filter(r#"USERNAME EQ "bjensen""#).unwrap();
        assert_eq!(f1, f2);
    }

    #[test]
    fn parses_presence() {
        let f = parse_filter("title pr").unwrap();
        assert_eq!(f, Filter::Present { path: AttrPath::simple("title") });
    }

    #[test]
    fn parses_and_or_flat_chain() {
        let f = parse_filter(
            r#"userName sw "J" and title pr and userType eq "Employee""#,
        )
        .unwrap();
        // Left associative: ((a and b) and c)
        match f {
            Filter::And(lhs, rhs) => {
                assert!(matches!(*rhs, Filter::Compare { .. }));
                assert!(matches!(*lhs, Filter::And(_, _)));
            }
            _ => panic!("expected And"),
        }
    }

    #[test]
    fn parses_not_with_parens() {
        let f = parse_filter(r#"not(userName eq "bjensen")"#).unwrap();
        assert!(matches!(f, Filter::Not(_)));
    }

    #[test]
    fn parens_alone_are_grouping_not_not() {
        let f = parse_filter(r#"(userName eq "bjensen")"#).unwrap();
        assert!(matches!(f, Filter::Compare { .. }));
    }

    #[test]
    fn parses_value_path() {
        let f = parse_filter(
            r#"emails[type eq "work" and value co "@example.com"]"#,
        )
        .unwrap();
        match f {
            Filter::ValuePath { path, filter } => {
                assert_eq!(path.attr, "emails");
                assert!(matches!(*filter, Filter::And(_, _)));
            }
            _ => panic!("expected ValuePath"),
        }
    }

    #[test]
    fn uri_qualified_attr_path_uses_last_colon() {
        let f = parse_filter(
            r#"urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:employeeNumber eq "701984""#,
        )
        .unwrap();
        match f {
            Filter::Compare { path, .. } => {
                assert_eq!(
                    path.uri.as_deref(),
                    Some(
                        "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User"
                    )
                );
                assert_eq!(path.attr, "employeeNumber");
            }
            _ => panic!("expected Compare"),
        }
    }

    #[test]
    fn sub_attr_path_parses() {
        let f = parse_filter(r#"name.familyName eq "O'Malley""#).unwrap();
        match f {
            Filter::Compare { path, .. } => {
                assert_eq!(path.attr, "name");
                assert_eq!(path.sub_attr.as_deref(), Some("familyName"));
            }
            _ => panic!("expected Compare"),
        }
    }

    #[test]
    fn round_trips_through_serialize() {
        let inputs = [
            r#"userName eq "bjensen""#,
            r#"title pr"#,
            r#"not(title pr)"#,
            r#"userName sw "J" and title pr"#,
            r#"emails[type eq "work" and value co "@example.com"]"#,
        ];
        for input in inputs {
            let first = parse_filter(input).unwrap();
            let serialized = first.serialize();
            let second = parse_filter(&serialized).unwrap();
            assert_eq!(first, second, "round trip mismatch for {input:?}");
        }
    }

    #[test]
    fn nested_value_path_with_not_and_or_does_not_replicate_the_known_bug() {
        // A documented defect in some parsers mishandles a `not(...)`
        // clause containing a URI-qualified attrExp when nested inside a
        // valuePath combined with `or`. This implementation has no such
        // special case: the grammar is applied uniformly.
        let f = parse_filter(
            r#"emails[value eq "a@example.com" or not(urn:ietf:params:scim:schemas:core:2.0:User:active eq true)]"#,
        )
        .unwrap();
        assert!(matches!(f, Filter::ValuePath { .. }));
        let serialized = f.serialize();
        let reparsed = parse_filter(&serialized).unwrap();
        assert_eq!(f, reparsed);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_filter("userName >< \"x\"").is_err());
        assert!(parse_filter("userName eq").is_err());
        assert!(parse_filter("").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Any identifier except `not`: at the start of a base filter, an
    /// attribute path spelled `not` is indistinguishable from the `not(...)`
    /// keyword, so it is excluded rather than asserted to round-trip.
    fn arb_attr_name() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9]{0,9}"
            .prop_filter("must not be the 'not' keyword", |s| {
                !s.eq_ignore_ascii_case("not")
            })
    }

    fn arb_attr_path() -> impl Strategy<Value = AttrPath> {
        (arb_attr_name(), proptest::option::of(arb_attr_name())).prop_map(
            |(attr, sub_attr)| AttrPath { uri: None, attr, sub_attr },
        )
    }

    fn arb_compare_op() -> impl Strategy<Value = CompareOp> {
        prop_oneof![
            Just(CompareOp::Eq),
            Just(CompareOp::Ne),
            Just(CompareOp::Co),
            Just(CompareOp::Sw),
            Just(CompareOp::Ew),
            Just(CompareOp::Gt),
            Just(CompareOp::Lt),
            Just(CompareOp::Ge),
            Just(CompareOp::Le),
        ]
    }

    fn arb_filter_value() -> impl Strategy<Value = FilterValue> {
        prop_oneof![
            "[a-zA-Z0-9 ]{0,12}".prop_map(FilterValue::Str),
            any::<i16>().prop_map(|n| FilterValue::Num(n as f64)),
            any::<bool>().prop_map(FilterValue::Bool),
            Just(FilterValue::Null),
        ]
    }

    /// Bounded-depth `Filter` generator: leaves are `Compare`/`Present`,
    /// internal nodes recurse through `And`/`Or`/`Not`/`ValuePath`.
    fn arb_filter() -> impl Strategy<Value = Filter> {
        let leaf = prop_oneof![
            (arb_attr_path(), arb_compare_op(), arb_filter_value()).prop_map(
                |(path, op, value)| Filter::Compare { path, op, value }
            ),
            arb_attr_path().prop_map(|path| Filter::Present { path }),
        ];

        leaf.prop_recursive(4, 32, 4, |inner| {
            prop_oneof![
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Filter::And(
                    Box::new(l),
                    Box::new(r)
                )),
                (inner.clone(), inner.clone()).prop_map(|(l, r)| Filter::Or(
                    Box::new(l),
                    Box::new(r)
                )),
                inner.clone().prop_map(|f| Filter::Not(Box::new(f))),
                (arb_attr_path(), inner).prop_map(|(path, filter)| {
                    Filter::ValuePath { path, filter: Box::new(filter) }
                }),
            ]
        })
    }

    proptest! {
        /// `parse(serialize(f)) == f` for any filter the parser
        /// itself can produce — serialization must always be re-parseable
        /// back to an equal AST.
        #[test]
        fn serialize_then_parse_round_trips(filter in arb_filter()) {
            let serialized = filter.serialize();
            let reparsed = parse_filter(&serialized)
                .unwrap_or_else(|e| panic!("failed to reparse {serialized:?}: {e}"));
            prop_assert_eq!(filter, reparsed);
        }
    }
}
