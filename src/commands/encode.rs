use crate::args::EncodeArgs;
use crate::commands::script::parse_line;
use anyhow::{Result, anyhow};
use tsip_monitor::tsip::bytes::hexdump;
use tsip_monitor::tsip::Command;

// Print the wire frame of one script command, for building fixtures by hand.
pub fn run_encode(args: EncodeArgs) -> Result<()> {
    let line = args.tokens.join(" ");
    println!("{}", encode_line(&line)?);
    Ok(())
}

pub fn encode_line(line: &str) -> Result<String> {
    let command: Command =
        parse_line(line)?.ok_or_else(|| anyhow!("expected a !TSIP or !TSIPV1 line: {line}"))?;
    Ok(hexdump(&command.frame()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_stuffs_dle() {
        assert_eq!(encode_line("!TSIP 8e 10").unwrap(), "108e10101003");
    }

    #[test]
    fn test_encode_enveloped_query() {
        assert_eq!(encode_line("!TSIPV1 a1 00 0").unwrap(), "10a100000200a31003");
    }

    #[test]
    fn test_encode_needs_a_directive() {
        assert!(encode_line("1c 03").is_err());
    }
}
