use anyhow::{Context, Result, anyhow, bail};
use serialport::SerialPort;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tsip_monitor::tsip::codec::is_enveloped_id;
use tsip_monitor::tsip::{Command, Mode, write_command};

// Read a command script. One command per line, `#` starts a comment, and
// every numeric token is hex with or without a `0x` prefix:
//
//   !TSIP 1c 03                  legacy id and body
//   !TSIPV1 a1 00 0 01           enveloped id, sub id, mode, data
pub fn parse_script(path: &Path) -> Result<Vec<Command>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading command script failed: {}", path.display()))?;
    let mut commands = Vec::new();

    for (line_idx, raw) in contents.lines().enumerate() {
        let command = parse_line(raw)
            .with_context(|| format!("invalid command at {}:{}", path.display(), line_idx + 1))?;
        if let Some(command) = command {
            commands.push(command);
        }
    }

    Ok(commands)
}

// One script line. Blank lines, comments and unknown directives give `None`.
pub fn parse_line(raw: &str) -> Result<Option<Command>> {
    let line = raw.split('#').next().unwrap_or("").trim();
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&directive, args)) = tokens.split_first() else {
        return Ok(None);
    };
    match directive {
        "!TSIP" => parse_legacy(args).map(Some),
        "!TSIPV1" => parse_enveloped(args).map(Some),
        _ => Ok(None),
    }
}

fn parse_legacy(args: &[&str]) -> Result<Command> {
    if args.is_empty() {
        bail!("!TSIP expects at least an id");
    }
    let bytes = args
        .iter()
        .map(|token| parse_hex_byte(token))
        .collect::<Result<Vec<u8>>>()?;
    if is_enveloped_id(bytes[0]) {
        bail!("id x{:02x} is enveloped, use !TSIPV1", bytes[0]);
    }
    Ok(Command::Legacy(bytes))
}

fn parse_enveloped(args: &[&str]) -> Result<Command> {
    if args.len() < 3 {
        bail!("!TSIPV1 expects id, sub id and mode, got {} argument(s)", args.len());
    }
    let id = parse_hex_byte(args[0])?;
    if !is_enveloped_id(id) {
        bail!("id x{id:02x} is not an enveloped id");
    }
    let sub_id = parse_hex_byte(args[1])?;
    let mode_code = parse_hex_byte(args[2])?;
    let mode = Mode::from_code(mode_code).ok_or_else(|| anyhow!("invalid mode: {}", args[2]))?;
    let data = args[3..]
        .iter()
        .map(|token| parse_hex_byte(token))
        .collect::<Result<Vec<u8>>>()?;
    Ok(Command::enveloped(id, sub_id, mode, data))
}

fn parse_hex_byte(raw: &str) -> Result<u8> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    u8::from_str_radix(digits, 16).with_context(|| format!("invalid hex byte: {raw}"))
}

// Write each command with a short pause so the receiver can keep up.
pub fn send_commands(
    port: &mut dyn SerialPort,
    commands: &[Command],
    pause_between_commands: Duration,
) -> Result<()> {
    for command in commands {
        write_command(port, command)
            .with_context(|| format!("writing command {} failed", command.tag()))?;
        thread::sleep(pause_between_commands);
    }
    Ok(())
}
