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

mod args;
mod input;
mod raw;

use std::{
    fs::File,
    io::Read,
    process::ExitCode,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use datfox::{
    audio::AudioSink,
    block::BlockAssembler,
    dds::DdsReceiver,
    nrzi::NrziDeframer,
    sink::SymbolSink,
    track::TrackFramer,
    RfDecoder, DEFAULT_SAMPLE_RATE,
};

use crate::{
    args::{app_parser, AppParams, DecodeMode},
    input::SampleReader,
    raw::RawWordDumper,
};

/// Samples pulled from the input per pump iteration; also how often the
/// run flag is polled.
const SAMPLES_PER_READ: usize = 1000;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let params = app_parser().run();

    if params.out_path.is_some() && params.mode == DecodeMode::Raw {
        eprintln!("Can't dump result unless doing DAT audio or DDS.");
        return ExitCode::FAILURE;
    }

    if params.session.is_some() && params.mode != DecodeMode::Dds {
        eprintln!("DDS session number is only valid for DDS.");
        return ExitCode::FAILURE;
    }

    let input: Box<dyn Read> = match &params.in_file {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(file),
            Err(e) => {
                eprintln!("Can't open file '{}': {}.", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(std::io::stdin()),
    };

    // SIGINT lets the current chunk finish, then the pipeline drains and
    // the output files are finalized.
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        if let Err(e) = ctrlc::set_handler(move || running.store(false, Ordering::SeqCst)) {
            eprintln!("Can't install signal handler: {}.", e);
            return ExitCode::FAILURE;
        }
    }

    match run(params, input, running) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(params: AppParams, input: Box<dyn Read>, running: Arc<AtomicBool>) -> Result<(), String> {
    match params.mode {
        DecodeMode::Dat => {
            let mut audio = AudioSink::new();
            if let Some(path) = &params.out_path {
                audio
                    .set_dump_file(path)
                    .map_err(|e| format!("Can't dump to output file '{}': {}.", path.display(), e))?;
            }
            let pipeline =
                NrziDeframer::new(BlockAssembler::new(TrackFramer::new(audio)));
            pump(RfDecoder::new(DEFAULT_SAMPLE_RATE, pipeline), input, running);
        }
        DecodeMode::Dds => {
            let mut dds = DdsReceiver::new();
            if let Some(path) = &params.out_path {
                dds.dump_to_directory(path.clone());
            }
            if let Some(session) = params.session {
                dds.dump_session(session);
            }
            let pipeline = NrziDeframer::new(BlockAssembler::new(TrackFramer::new(dds)));
            pump(RfDecoder::new(DEFAULT_SAMPLE_RATE, pipeline), input, running);
        }
        DecodeMode::Raw => {
            let pipeline = NrziDeframer::new(RawWordDumper::default());
            pump(RfDecoder::new(DEFAULT_SAMPLE_RATE, pipeline), input, running);
        }
    }

    Ok(())
}

fn pump<S: SymbolSink>(mut decoder: RfDecoder<S>, input: Box<dyn Read>, running: Arc<AtomicBool>) {
    let mut reader = SampleReader::new(input, SAMPLES_PER_READ);
    let mut samples = [0f32; SAMPLES_PER_READ];

    while running.load(Ordering::SeqCst) {
        let n = reader.read_samples(&mut samples);
        if n == 0 {
            break;
        }
        decoder.process(&samples[..n]);
    }

    decoder.stop();
}
