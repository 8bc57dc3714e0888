/*
    datfox
    https://github.com/dbalsom/datfox

    Copyright 2024-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------
*/

use std::path::PathBuf;

use bpaf::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    Dat,
    Dds,
    Raw,
}

#[derive(Debug, Clone)]
pub struct AppParams {
    pub mode: DecodeMode,
    pub in_file: Option<PathBuf>,
    pub out_path: Option<PathBuf>,
    pub session: Option<u32>,
}

#[derive(Debug, Clone)]
struct RawParams {
    dat: bool,
    dds: bool,
    raw: bool,
    in_file: Option<PathBuf>,
    out_path: Option<PathBuf>,
    session: Option<u32>,
}

pub fn app_parser() -> OptionParser<AppParams> {
    let dat = short('a').help("Decode DAT digital audio (default)").switch();
    let dds = short('d').help("Decode DDS computer data").switch();
    let raw = short('r')
        .help("Dump raw line words; don't interpret as DAT nor DDS")
        .switch();
    let in_file = short('f')
        .argument::<PathBuf>("FILE")
        .help("Read samples from FILE (default is stdin)")
        .optional();
    let out_path = short('o')
        .argument::<PathBuf>("PATH")
        .help("DAT mode: write audio to PATH. DDS mode: dump basic groups into directory PATH")
        .optional();
    let session = short('s')
        .argument::<u32>("NUMBER")
        .help("Dump DDS session NUMBER (DDS only)")
        .optional();

    construct!(RawParams {
        dat,
        dds,
        raw,
        in_file,
        out_path,
        session
    })
    .guard(
        |p| [p.dat, p.dds, p.raw].iter().filter(|&&f| f).count() <= 1,
        "only one of -a, -d and -r may be selected",
    )
    .map(|p| {
        let mode = if p.raw {
            DecodeMode::Raw
        } else if p.dds {
            DecodeMode::Dds
        } else {
            DecodeMode::Dat
        };
        AppParams {
            mode,
            in_file: p.in_file,
            out_path: p.out_path,
            session: p.session,
        }
    })
    .to_options()
    .descr(
        "Decode DAT/DDS samples taken from an R-DAT RF head. Input must be in \
         IEEE-float format, in native-endian order, and sampled at 75.264MHz.",
    )
}
