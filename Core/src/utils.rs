use std::num::ParseFloatError;

/// Parses a numeric literal lexeme (as produced by the scanner) into the
/// `f64` the language uses uniformly for its `number` type.
///
/// ```bnf
/// NUMBER_LITERAL ::= DIGIT+ ("." DIGIT+)? (("e"|"E") "-"? DIGIT+)?
/// ```
pub fn parse_number_lexeme(lexeme: &str) -> Result<f64, ParseFloatError> {
  lexeme.replace('_', "").parse::<f64>()
}
