pub mod config;
pub mod logging;
pub mod output;

use std::num::ParseIntError;

pub fn parse_u32(input: &str) -> Result<u32, ParseIntError> {
    parse_int::parse(input)
}

#[cfg(test)]
mod test {
    use super::parse_u32;
    use test_case::test_case;

    #[test_case("115200", 115200)]
    #[test_case("0x1c200", 115200)]
    #[test_case("0b1010", 10)]
    fn parse_numbers(input: &str, expected: u32) {
        assert_eq!(parse_u32(input), Ok(expected));
    }

    #[test]
    fn reject_garbage() {
        assert!(parse_u32("fast").is_err());
    }
}
