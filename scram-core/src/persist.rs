//! Legacy `.mcs` cut-set file format: a single integer header line giving
//! the maximum cut-set order found, followed by the group lines
//! [`crate::sop::Expr::serialise`] already produces, terminated by the
//! blank line `serialise` already writes.
//!
//! `Expr::serialise`/`Expr::parse` handle the group list; this module
//! only adds the header line that precedes it.

use std::io::{BufRead, Write};

use crate::error::{ScramError, ScramResult};
use crate::sop::Expr;

/// Write `expr` to `out` in `.mcs` format: `<max order>\n` followed by
/// `expr.serialise()`.
pub fn write(expr: &Expr, out: &mut impl Write) -> ScramResult<()> {
    let max_order = expr.groups().iter().map(|g| g.order()).max().unwrap_or(0);
    writeln!(out, "{max_order}")?;
    out.write_all(expr.serialise().as_bytes())?;
    Ok(())
}

/// Read a `.mcs` file of the given basic-event `width` back into an `Expr`.
pub fn read(width: usize, input: &mut impl BufRead) -> ScramResult<Expr> {
    let mut header = String::new();
    input.read_line(&mut header)?;
    header
        .trim()
        .parse::<usize>()
        .map_err(|_| ScramError::parse(format!("'.mcs' header is not an integer: {header:?}")))?;

    let mut rest = String::new();
    input.read_to_string(&mut rest)?;
    Expr::parse(width, &rest).ok_or_else(|| ScramError::parse("malformed '.mcs' group line"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::BitSet;
    use crate::sop::Group;

    #[test]
    fn roundtrip_through_mcs_format() {
        let width = 5;
        let mut expr = Expr::create(width);
        expr.or_group(Group::new(BitSet::from_indices(width, [0, 2])));
        expr.or_group(Group::new(BitSet::from_indices(width, [1])));

        let mut buf = Vec::new();
        write(&expr, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().next().unwrap(), "2");

        let mut cursor = std::io::Cursor::new(text.into_bytes());
        let back = read(width, &mut cursor).unwrap();
        assert_eq!(expr, back);
    }

    #[test]
    fn rejects_non_integer_header() {
        let mut cursor = std::io::Cursor::new(b"not-a-number\n".to_vec());
        assert!(read(5, &mut cursor).is_err());
    }
}
