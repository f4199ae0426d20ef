use std::fmt;

/// A metadata token identifying one entity of the analyzed program.
///
/// Tokens in .NET metadata consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table type
/// - The low 24 bits (bits 0-23) indicate the row index within that table
///
/// Tokens are stable for the whole analysis run, which is what allows rules to
/// memoize per-entity results keyed by token.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Token(pub u32);

impl Token {
    /// `TypeRef` table - a reference to a type that may live outside the analyzed set
    pub const TYPE_REF: u8 = 0x01;
    /// `TypeDef` table - a type definition
    pub const TYPE_DEF: u8 = 0x02;
    /// `MethodDef` table
    pub const METHOD_DEF: u8 = 0x06;
    /// `Event` table
    pub const EVENT: u8 = 0x14;

    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table id and a row index.
    ///
    /// The row is truncated to 24 bits.
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the token points into the `TypeRef` table
    #[must_use]
    pub fn is_type_ref(&self) -> bool {
        self.table() == Self::TYPE_REF
    }

    /// Returns true if the token points into the `TypeDef` table
    #[must_use]
    pub fn is_type_def(&self) -> bool {
        self.table() == Self::TYPE_DEF
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_parts() {
        let token = Token::from_parts(Token::METHOD_DEF, 1);
        assert_eq!(token.value(), 0x06000001);
        assert_eq!(token.table(), 0x06);
        assert_eq!(token.row(), 1);
    }

    #[test]
    fn test_token_row_truncation() {
        let token = Token::from_parts(Token::TYPE_DEF, 0x0100_0005);
        assert_eq!(token.table(), Token::TYPE_DEF);
        assert_eq!(token.row(), 5);
    }

    #[test]
    fn test_token_table_predicates() {
        assert!(Token::new(0x01000003).is_type_ref());
        assert!(!Token::new(0x01000003).is_type_def());
        assert!(Token::new(0x02000003).is_type_def());
        assert!(Token::new(0).is_null());
    }

    #[test]
    fn test_token_formatting() {
        let token = Token::new(0x14000002);
        assert_eq!(format!("{token}"), "0x14000002");
        assert_eq!(
            format!("{token:?}"),
            "Token(0x14000002, table: 0x14, row: 2)"
        );
    }

    #[test]
    fn test_token_as_set_key() {
        let mut set = HashSet::new();
        set.insert(Token::new(0x02000001));
        set.insert(Token::from_parts(Token::TYPE_DEF, 1));
        set.insert(Token::new(0x02000002));
        assert_eq!(set.len(), 2);
    }
}
