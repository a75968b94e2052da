//! Built-in instrument program
//!
//! The session treats the program as opaque text handed to
//! [`Engine::compile_program`](crate::Engine::compile_program). The default one
//! streams the staged file named on the `filename` string channel, scales it by
//! the `vol` channel and publishes a 0-1 RMS level on the `level` channel.

/// File player program using the default [`ChannelNames`](crate::ChannelNames)
pub const DEFAULT_PROGRAM: &str = r#"
sr = 44100
ksmps = 256
nchnls = 2
0dbfs = 1

instr 1
    kvol chnget "vol"
    Sfile chnget "filename"
    ainL, ainR diskin Sfile, 1

    aoutL = ainL * kvol
    aoutR = ainR * kvol

    krms rms (aoutL + aoutR) / 2, 20
    klevel = krms * 2
    klevel = (klevel > 1 ? 1 : klevel)
    chnset klevel, "level"

    out aoutL, aoutR
endin

schedule(1, 0, -1)
"#;
