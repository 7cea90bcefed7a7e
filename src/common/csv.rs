// src/common/csv.rs
//
// Escrita de CSV minimalista para o export de clientes. Campos com vírgula,
// aspas ou quebra de linha são citados conforme o RFC 4180.

use std::borrow::Cow;

pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

pub fn write_row(out: &mut String, fields: &[&str]) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        out.push_str(&escape_field(field));
        first = false;
    }
    out.push_str("\r\n");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(escape_field("Acme"), "Acme");
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn fields_with_separators_are_quoted() {
        assert_eq!(escape_field("Rua A, 123"), "\"Rua A, 123\"");
        assert_eq!(escape_field("linha1\nlinha2"), "\"linha1\nlinha2\"");
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(escape_field("a \"b\" c"), "\"a \"\"b\"\" c\"");
    }

    #[test]
    fn rows_join_fields_with_commas() {
        let mut out = String::new();
        write_row(&mut out, &["Name", "Email"]);
        write_row(&mut out, &["Acme, SA", ""]);
        assert_eq!(out, "Name,Email\r\n\"Acme, SA\",\r\n");
    }
}
