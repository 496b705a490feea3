// Value and flag meaning tables, used only to render diagnostics.

pub struct ValueName {
    pub value: u32,
    pub name: &'static str,
}

// A flag entry matches when `bits & mask == value`, so a zero value names
// the cleared state of the masked bits.
pub struct FlagName {
    pub value: u32,
    pub mask: u32,
    pub name: &'static str,
}

const fn v(value: u32, name: &'static str) -> ValueName {
    ValueName { value, name }
}

const fn f(value: u32, mask: u32, name: &'static str) -> FlagName {
    FlagName { value, mask, name }
}

pub fn value_name(value: u32, table: &[ValueName]) -> &'static str {
    table
        .iter()
        .find(|entry| entry.value == value)
        .map(|entry| entry.name)
        .unwrap_or("Unk")
}

pub fn flag_names(bits: u32, table: &[FlagName]) -> String {
    table
        .iter()
        .filter(|entry| bits & entry.mask == entry.value)
        .map(|entry| entry.name)
        .collect::<Vec<_>>()
        .join(":")
}

// Enveloped generation

pub static DATA_BITS_V1: &[ValueName] = &[v(3, "8 bits")];

pub static ERROR_CODES_V1: &[ValueName] = &[
    v(1, "Parameter Error"),
    v(2, "Length Error"),
    v(3, "Invalid Packet Format"),
    v(4, "Invalid Checksum"),
    v(5, "Bad TNL/User mode"),
    v(6, "Invalid Packet ID"),
    v(7, "Invalid Subpacket ID"),
    v(8, "Update in Progress"),
    v(9, "Internal Error (div by 0)"),
    v(10, "Internal Error (failed queuing)"),
];

pub static FIX_TYPE_V1: &[ValueName] = &[v(0, "No Fix"), v(1, "1D"), v(2, "3D")];

pub static DECODE_STATUS_V1: &[ValueName] = &[
    v(0, "Doing Fixes"),
    v(1, "No GPS time"),
    v(2, "PDOP too high"),
    v(3, "0 usable sats"),
    v(4, "1 usable sat"),
    v(5, "2 usable sats"),
    v(6, "3 usable sats"),
    v(0xff, "GPS Time Fix (OD mode)"),
];

pub static MAJOR_ALARMS_V1: &[FlagName] = &[
    f(1, 1, "Not tracking sats"),
    f(2, 2, "PPS bad"),
    f(4, 4, "PPS not generated"),
    f(0x80, 0x80, "Spoofing/Multipath"),
    f(0x100, 0x100, "Jamming"),
];

pub static MINOR_ALARMS_V1: &[FlagName] = &[
    f(1, 1, "Ant Open"),
    f(2, 2, "Ant Short"),
    f(4, 4, "Leap Pending"),
    f(8, 8, "Almanac Incomplete"),
    f(0x10, 0x10, "Survey in Progress"),
    f(0x20, 0x20, "GPS Almanac Incomplete"),
    f(0x20, 0x20, "GLO Almanac Incomplete"),
    f(0x40, 0x40, "BDS Almanac Incomplete"),
    f(0x80, 0x80, "GAL Almanac Incomplete"),
    f(0x100, 0x100, "Leap Second Insertion"),
    f(0x200, 0x200, "Leap Second Deletion"),
];

pub static PARITY_V1: &[ValueName] = &[
    v(0, "None"),
    v(1, "Odd"),
    v(2, "Even"),
    v(255, "Ignore"),
];

pub static PORT_NAME_V1: &[ValueName] = &[
    v(0, "Port A"),
    v(1, "Port B"),
    v(255, "Current Port"),
];

pub static PORT_TYPE_V1: &[ValueName] = &[v(0, "UART")];

pub static POSITION_MASK_V1: &[FlagName] = &[
    f(0, 1, "Real Time Position"),
    f(1, 1, "Surveyed Position"),
    f(0, 2, "LLA Position"),
    f(2, 2, "XYZ ECEF"),
    f(0, 4, "HAE"),
    f(4, 4, "MSL"),
    f(0, 8, "Velocity ENU"),
    f(8, 8, "Velocity ECEF"),
];

pub static PPS_MASK_V1: &[ValueName] = &[
    v(0, "Off"),
    v(1, "On"),
    v(2, "Fix Based"),
    v(3, "When Valid"),
    v(4, "Off"),
    v(5, "On/Negative"),
    v(6, "Fix Based/Negative"),
    v(7, "When Valid/Negative"),
];

pub static PROTOCOL_V1: &[ValueName] = &[v(2, "TSIP"), v(4, "NMEA"), v(255, "Ignore")];

pub static RECEIVER_MODE_V1: &[ValueName] = &[
    v(0, "2D"),
    v(1, "(3D) Time Only"),
    v(3, "Automatic"),
    v(6, "Overdetermined"),
];

// x92-00 reset types and x92-01 reset causes share one numbering.
pub static RESET_TYPE_V1: &[ValueName] = &[
    v(1, "Cold Reset"),
    v(2, "Hot Reset"),
    v(3, "Warm Reset"),
    v(4, "Factory Reset"),
    v(5, "System Reset"),
    v(6, "Power Cycle"),
    v(7, "Watchdog"),
    v(8, "Hardfault"),
];

pub static SAT_FLAGS_V1: &[FlagName] = &[
    f(1, 1, "Acquired"),
    f(2, 2, "Used in Position"),
    f(4, 4, "Used in PPS"),
];

pub static SPEED_V1: &[ValueName] = &[
    v(11, "115200"),
    v(12, "230400"),
    v(13, "460800"),
    v(14, "921600"),
    v(255, "Ignore"),
];

pub static SELF_SURVEY_MASK_V1: &[FlagName] = &[
    f(1, 1, "SS restarted"),
    f(0, 2, "SS Disabled"),
    f(2, 2, "SS Enabled"),
    f(0, 8, "Don't save position"),
    f(8, 8, "Save position"),
];

pub static STOP_BITS_V1: &[ValueName] = &[v(0, "1 bit"), v(1, "2 bit"), v(255, "Ignore")];

pub static SV_TYPE_V1: &[ValueName] = &[
    v(1, "GPS L1C"),
    v(2, "GPS L2"),
    v(3, "GPS L5"),
    v(5, "GLO G1"),
    v(6, "GLO G2"),
    v(9, "SBAS"),
    v(13, "BDS B1"),
    v(14, "BDS B2i"),
    v(15, "BDS B2a"),
    v(17, "GAL E1"),
    v(18, "GAL E5a"),
    v(19, "GAL E5b"),
    v(20, "GAL E6"),
    v(22, "QZSS L1"),
    v(23, "QZSS L2C"),
    v(24, "QZSS L5"),
    v(26, "IRNSS L5"),
];

pub static SV_TYPES_V1: &[FlagName] = &[
    f(1, 1, "GPS L1C"),
    f(2, 2, "GPS L2"),
    f(4, 4, "GPS L5"),
    f(0x20, 0x20, "GLO G1"),
    f(0x40, 0x40, "GLO G2"),
    f(0x100, 0x100, "SBAS"),
    f(0x1000, 0x1000, "BDS B1"),
    f(0x2000, 0x2000, "BDS B2i"),
    f(0x4000, 0x4000, "BDS B2a"),
    f(0x10000, 0x10000, "GAL E1"),
    f(0x20000, 0x20000, "GAL E5a"),
    f(0x40000, 0x40000, "GAL E5b"),
    f(0x80000, 0x80000, "GAL E6"),
    f(0x100000, 0x100000, "QZSS L1"),
    f(0x200000, 0x200000, "QZSS L2C"),
    f(0x400000, 0x400000, "QZSS L5"),
    f(0x1000000, 0x1000000, "IRNSS L5"),
];

pub static TIME_BASE_V1: &[ValueName] = &[
    v(0, "GPS"),
    v(1, "GLO"),
    v(2, "BDS"),
    v(3, "GAL"),
    v(4, "GPS/UTC"),
    v(5, "GLO/UTC"),
    v(6, "BDS/UTC"),
    v(7, "GAL/UTC"),
];

pub static TIME_FLAGS_V1: &[FlagName] = &[
    f(0, 1, "UTC Invalid"),
    f(1, 1, "UTC Valid"),
    f(0, 2, "Time Invalid"),
    f(2, 2, "Time Valid"),
];

pub static SAVE_STATUS_V1: &[FlagName] = &[f(0, 1, "Save failed"), f(1, 1, "Save OK")];

// Legacy generation

pub static ERROR_CODES: &[FlagName] = &[
    f(1, 1, "No Bat"),
    f(0x10, 0x30, "Ant Open"),
    f(0x30, 0x30, "Ant Short"),
];

pub static DECODE_STATUS: &[ValueName] = &[
    v(0, "Doing Fixes"),
    v(1, "No GPS time"),
    v(2, "Needs Init"),
    v(3, "PDOP too high"),
    v(8, "0 usable sats"),
    v(9, "1 usable sat"),
    v(10, "2 usable sats"),
    v(11, "3 usable sats"),
    v(12, "chosen sat unusable"),
    v(16, "TRAIM rejected"),
    v(0xbb, "GPS Time Fix (OD mode)"),
];

pub static DISCIPLINE_ACTIVITY: &[ValueName] = &[
    v(0, "Phase Locking"),
    v(1, "OSC Warm-up"),
    v(2, "Freq locking"),
    v(3, "Placing PPS"),
    v(4, "Init Loop Filter"),
    v(5, "Comp OCXO"),
    v(6, "Inactive"),
    v(7, "Not used"),
    v(8, "Recovery Mode"),
];

pub static PPS_INDICATION: &[ValueName] = &[v(0, "PPS Good"), v(1, "PPS Ungood")];

pub static PPS_REFERENCE: &[ValueName] = &[v(0, "GNSS"), v(1, "External"), v(0xff, "None")];

pub static BROADCAST_MASK0: &[FlagName] = &[
    f(1, 1, "x8f-ab"),
    f(4, 4, "x8f-ac"),
    f(0x40, 0x40, "Automatic"),
];

pub static RECEIVER_MODE: &[ValueName] = &[
    v(0, "Autonomous (2D/3D)"),
    v(1, "Time Only (1-SV)"),
    v(3, "2D"),
    v(4, "3D"),
    v(5, "DGPS"),
    v(6, "2D Clock hold"),
    v(7, "Overdetermined"),
];

pub static SELF_SURVEY_ENABLE: &[ValueName] = &[v(0, "SS Disabled"), v(1, "SS Enabled")];

pub static SELF_SURVEY_SAVE: &[ValueName] = &[v(0, "Don't Save"), v(1, "Save at end")];

pub static STATUS1: &[FlagName] = &[f(2, 2, "RTC invalid"), f(8, 8, "No Almanac")];

pub static STATUS2: &[FlagName] = &[f(1, 1, "Superpackets"), f(2, 2, "Superpackets 2")];

pub static SV_BAD: &[ValueName] = &[v(0, "OK"), v(1, "Bad Parity"), v(2, "Bad Health")];

pub static SV_TYPE: &[ValueName] = &[
    v(0, "GPS"),
    v(1, "GLO"),
    v(2, "BDS"),
    v(3, "GAL"),
    v(6, "QZSS"),
];

pub static SV_USED_FLAGS: &[FlagName] =
    &[f(1, 1, "Used in Timing"), f(2, 2, "Used in Position")];

pub static X4C_DYNAMICS: &[ValueName] = &[v(1, "Land"), v(2, "Sea"), v(3, "Air")];

pub static X55_AUX: &[FlagName] = &[f(0, 1, "x5a Off"), f(1, 1, "x5a On")];

pub static X55_POSITION: &[FlagName] = &[
    f(1, 1, "ECEF On"),
    f(2, 2, "LLA On"),
    f(0, 4, "HAE"),
    f(4, 4, "MSL"),
    f(0, 0x10, "Single Precision"),
    f(0x10, 0x10, "Double Position"),
];

pub static X55_TIMING: &[FlagName] = &[f(1, 1, "Use x8e-a2")];

pub static X55_VELOCITY: &[FlagName] = &[f(1, 1, "ECEF On"), f(2, 2, "ENU On")];

pub static X57_INFO: &[FlagName] = &[f(0, 1, "Old Fix"), f(1, 1, "New Fix")];

pub static X57_FIX_MODE: &[ValueName] = &[
    v(0, "No Fix"),
    v(1, "Time"),
    v(3, "2D Fix"),
    v(4, "3D Fix"),
    v(5, "OD Fix"),
];

pub static X5C_ACQUISITION: &[ValueName] = &[v(0, "Never"), v(1, "Yes"), v(2, "Search")];

pub static X5C_EPHEMERIS: &[ValueName] = &[
    v(0, "none"),
    v(1, "Decoded"),
    v(3, "Decoded/Healthy"),
    v(19, "Used"),
    v(51, "Used/DGPS"),
];

pub static X82_MODE: &[ValueName] = &[
    v(0, "Man DGPS Off"),
    v(1, "Man DGPS On"),
    v(2, "Auto DGPS Off"),
    v(3, "Auto DGPS On"),
];

pub static X8F20_FIX_FLAGS: &[FlagName] = &[
    f(0, 1, "Fix Yes"),
    f(2, 2, "DGPS"),
    f(0, 4, "3D"),
    f(4, 4, "2D"),
    f(8, 8, "Alt Hold"),
    f(0x10, 0x10, "Filtered"),
];

pub static FIX_DIMENSION: &[FlagName] = &[
    f(0, 7, "No Fix"),
    f(1, 7, "1D/OD Fix"),
    f(3, 7, "2D Fix"),
    f(4, 7, "3D Fix"),
    f(5, 7, "OD Fix"),
    f(6, 7, "DGPS"),
    f(0, 8, "Auto"),
    f(8, 8, "Manual"),
];

pub static TIMING_FLAGS: &[FlagName] = &[
    f(0, 1, "GPS time"),
    f(1, 1, "UTC time"),
    f(0, 2, "GPS PPS"),
    f(2, 2, "UTC PPS"),
    f(4, 4, "Time not set"),
    f(8, 8, "no UTC info"),
    f(0x10, 0x10, "time from user"),
];

pub static CRITICAL_ALARMS: &[FlagName] = &[
    f(1, 1, "ROM error"),
    f(2, 2, "RAM error"),
    f(4, 4, "FPGA error"),
    f(8, 8, "Power error"),
    f(0x10, 0x10, "OSC error"),
];

pub static MINOR_ALARMS: &[FlagName] = &[
    f(1, 1, "OSC warning"),
    f(2, 2, "Ant Open"),
    f(4, 4, "Ant Short"),
    f(8, 8, "Not tracking Sats"),
    f(0x10, 0x10, "Osc unlocked"),
    f(0x20, 0x20, "Survey in progress"),
    f(0x40, 0x40, "No stored Position"),
    f(0x80, 0x80, "Leap Sec Pending"),
    f(0x100, 0x100, "Test Mode"),
    f(0x200, 0x200, "Position questionable"),
    f(0x400, 0x400, "EEROM corrupt"),
    f(0x800, 0x800, "Almanac Incomplete"),
    f(0x1000, 0x1000, "PPS generated"),
];
