use crate::tsip::bytes::{put_be16, put_be32, put_bef32};
use crate::tsip::codec::Command;
use log::{info, warn};
use std::fmt;

// I/O options (0x35) bits, byte 1 position
pub const IO1_ECEF: u8 = 0x01;
pub const IO1_LLA: u8 = 0x02;
pub const IO1_MSL: u8 = 0x04;
pub const IO1_DP: u8 = 0x10;
pub const IO1_8F20: u8 = 0x20;
// byte 2 velocity
pub const IO2_VECEF: u8 = 0x01;
pub const IO2_ENU: u8 = 0x02;
// byte 4 auxiliary
pub const IO4_DBHZ: u8 = 0x08;

const ELEVATION_MASK_RAD: f32 = 10.0 * std::f32::consts::PI / 180.0;

// Which fixed configuration sequence a receiver gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFamily {
    Generic,
    AcutimeGold,
    Res360,
}

impl fmt::Display for ConfigFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConfigFamily::Generic => "generic",
            ConfigFamily::AcutimeGold => "Acutime Gold",
            ConfigFamily::Res360 => "RES 360",
        })
    }
}

// Receiver names by x1c-83 / x90-01 hardware code.
pub fn hardware_name(code: u16) -> Option<&'static str> {
    let name = match code {
        1001 => "Lassen iQ",
        1002 => "Copernicus",
        1003 => "Copernicus II",
        3001 => "Acutime Gold",
        3002 => "RES T",
        3007 => "Thunderbolt E",
        3009 => "RES SMT",
        3017 => "Resolution SMTx",
        3023 => "RES SMT 360",
        3026 => "ICM SMT 360",
        3031 => "RES360 17x22",
        3032 => "Acutime 360",
        3100 => "RES 720",
        _ => return None,
    };
    Some(name)
}

impl ConfigFamily {
    pub fn from_hardware_code(code: u16) -> Self {
        match code {
            3001 => ConfigFamily::AcutimeGold,
            3002 | 3009 | 3017 | 3023 | 3026 | 3031 | 3100 => ConfigFamily::Res360,
            1001 | 1002 | 1003 | 3007 | 3032 => ConfigFamily::Generic,
            other => {
                warn!("unknown hardware code {other}, using generic configuration");
                ConfigFamily::Generic
            }
        }
    }

    // Commands that put a receiver of this family into a known state. In
    // passive mode only the RES family differs: it asks instead of sets.
    pub fn commands(self, passive: bool) -> Vec<Command> {
        match self {
            ConfigFamily::Generic => generic_commands(),
            ConfigFamily::AcutimeGold => acutime_gold_commands(),
            ConfigFamily::Res360 => res360_commands(passive),
        }
    }
}

fn generic_commands() -> Vec<Command> {
    // double precision LLA plus x8f-20, ENU velocity, dBHz
    let io_options = [0x35, IO1_8F20 | IO1_DP | IO1_LLA, IO2_ENU, 0x00, IO4_DBHZ];

    // land dynamics, 10 deg elevation, signal 6.0, PDOP mask 8, switch 6
    let mut op_params = vec![0x2c, 0x01];
    put_bef32(&mut op_params, ELEVATION_MASK_RAD);
    put_bef32(&mut op_params, 6.0);
    put_bef32(&mut op_params, 8.0);
    put_bef32(&mut op_params, 6.0);

    vec![
        Command::legacy(&io_options),
        // software version, answered by x45
        Command::legacy(&[0x1f]),
        Command::legacy(&[0x21]),
        Command::Legacy(op_params),
        // auto 2D/3D
        Command::legacy(&[0x22, 0x00]),
        Command::legacy(&[0x28]),
        Command::legacy(&[0x37]),
        // output datum
        Command::legacy(&[0x8e, 0x15]),
        Command::legacy(&[0xbb, 0x00]),
    ]
}

fn acutime_gold_commands() -> Vec<Command> {
    // self-survey: enabled, save position, 2000 fixes, uncertainty 100/100
    let mut survey = vec![0x8e, 0xa9, 0x01, 0x01];
    put_be32(&mut survey, 2000);
    put_bef32(&mut survey, 100.0);
    put_bef32(&mut survey, 100.0);

    // primary receiver configuration, forced overdetermined clock
    let mut receiver = vec![0xbb, 0x00, 0x07, 0xff, 0x01, 0x01];
    put_bef32(&mut receiver, ELEVATION_MASK_RAD);
    put_bef32(&mut receiver, 4.0);
    put_bef32(&mut receiver, 8.0);
    put_bef32(&mut receiver, 6.0);
    receiver.extend_from_slice(&[0xff, 0x00]);
    put_be16(&mut receiver, 0xffff);
    put_be16(&mut receiver, 0x0000);
    for _ in 0..4 {
        put_be32(&mut receiver, 0xffff_ffff);
    }

    // broadcast: default plus primary and supplemental timing
    let mut broadcast = vec![0x8e, 0xa5];
    put_be16(&mut broadcast, 0x32e1);
    broadcast.extend_from_slice(&[0x00, 0x00]);

    vec![
        Command::legacy(&[0x1c, 0x01]),
        Command::Legacy(survey),
        // PPS driver switch, PPS always on
        Command::legacy(&[0x8e, 0x4e, 0x02]),
        Command::Legacy(receiver),
        Command::Legacy(broadcast),
    ]
}

fn res360_commands(passive: bool) -> Vec<Command> {
    let mut commands = vec![Command::legacy(&[0x8e, 0xa9])];
    if passive {
        commands.push(Command::legacy(&[0x35]));
        commands.push(Command::legacy(&[0xbb, 0x00]));
        commands.push(Command::legacy(&[0x8e, 0xa5]));
    } else {
        commands.push(Command::legacy(&[0x8e, 0xa5, 0x00, 0x45, 0x00, 0x00]));
        commands.push(Command::legacy(&[
            0x35,
            IO1_DP | IO1_LLA | IO1_ECEF,
            IO2_VECEF | IO2_ENU,
            // timing from x8e-a2
            0x01,
            IO4_DBHZ,
        ]));
    }
    commands
}

// Machine id names from x4b, used only until a better identity arrives.
// The second value says whether the receiver can answer x1c-01.
pub fn machine_name(id: u8) -> (&'static str, bool) {
    match id {
        0x01 => (" SMT 360", true),
        0x32 => (" Acutime 360", false),
        0x5a => (" Lassen iQ", true),
        0x61 => (" Acutime 2000", false),
        0x62 => (" ACE UTC", false),
        0x96 => (" Copernicus, Thunderbolt E", true),
        _ => ("", false),
    }
}

// What the session knows about the receiver it is talking to.
#[derive(Debug, Clone, Default)]
pub struct DeviceIdentity {
    pub hardware_code: u16,
    pub machine_id: u8,
    // 0 none, 1 x8f-20 capable, 2 modern superpackets
    pub superpacket: u8,
    // firmware / software description
    pub subtype: String,
    // hardware description
    pub subtype1: String,
    pub serial: String,
    configured_for: Option<u16>,
}

impl DeviceIdentity {
    // Family to configure, once per change of hardware code.
    pub fn select_configuration(&mut self) -> Option<ConfigFamily> {
        if self.configured_for == Some(self.hardware_code) {
            return None;
        }
        self.configured_for = Some(self.hardware_code);
        let family = ConfigFamily::from_hardware_code(self.hardware_code);
        info!(
            "configuring hardware {} ({}) as {family}",
            self.hardware_code,
            hardware_name(self.hardware_code).unwrap_or("unknown")
        );
        Some(family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_by_hardware_code() {
        assert_eq!(ConfigFamily::from_hardware_code(3001), ConfigFamily::AcutimeGold);
        assert_eq!(ConfigFamily::from_hardware_code(3023), ConfigFamily::Res360);
        assert_eq!(ConfigFamily::from_hardware_code(1003), ConfigFamily::Generic);
        assert_eq!(ConfigFamily::from_hardware_code(4242), ConfigFamily::Generic);
    }

    #[test]
    fn test_generic_sequence() {
        let cmds = ConfigFamily::Generic.commands(false);
        assert_eq!(cmds.len(), 9);
        assert_eq!(cmds[0], Command::legacy(&[0x35, 0x32, 0x02, 0x00, 0x08]));
        assert_eq!(cmds[3].body().len(), 18);
        assert_eq!(cmds[8], Command::legacy(&[0xbb, 0x00]));
    }

    #[test]
    fn test_acutime_gold_sequence() {
        let cmds = ConfigFamily::AcutimeGold.commands(false);
        assert_eq!(cmds[1].body().len(), 16);
        assert_eq!(cmds[3].body().len(), 44);
        assert_eq!(cmds[4].body(), vec![0x8e, 0xa5, 0x32, 0xe1, 0x00, 0x00]);
    }

    #[test]
    fn test_res360_passive_only_asks() {
        let cmds = ConfigFamily::Res360.commands(true);
        let bodies: Vec<Vec<u8>> = cmds.iter().map(|c| c.body()).collect();
        assert_eq!(
            bodies,
            vec![vec![0x8e, 0xa9], vec![0x35], vec![0xbb, 0x00], vec![0x8e, 0xa5]]
        );
        let active = ConfigFamily::Res360.commands(false);
        assert_eq!(active[2].body(), vec![0x35, 0x13, 0x03, 0x01, 0x08]);
    }

    #[test]
    fn test_select_once_per_code() {
        let mut id = DeviceIdentity {
            hardware_code: 3023,
            ..DeviceIdentity::default()
        };
        assert_eq!(id.select_configuration(), Some(ConfigFamily::Res360));
        assert_eq!(id.select_configuration(), None);
        id.hardware_code = 3001;
        assert_eq!(id.select_configuration(), Some(ConfigFamily::AcutimeGold));
    }
}
