use std::env;
use std::process::ExitCode;

use dlis_reader::dlis::envelope::{self, VisibleRecordHeader, VRL_SIZE};
use dlis_reader::dlis::sul::{self, StorageUnitLabel, SUL_SIZE};
use dlis_reader::{ByteSource, FileSource, Result};

fn main() -> ExitCode {
    env_logger::init();

    let mut args = env::args();
    let (_, path) = (args.next(), args.next());
    let path = match path {
        Some(path) if args.next().is_none() => path,
        _ => {
            eprintln!("usage: dlisio FILE");
            return ExitCode::FAILURE;
        }
    };

    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {}", path, err);
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str) -> Result<()> {
    let mut source = FileSource::open(path)?;

    let mut prefix = vec![0u8; source.size().min(200) as usize];
    source.read_at(&mut prefix, 0)?;
    let sul_tell = sul::find_sul(&prefix)?;
    if sul_tell != 0 {
        eprintln!("{} garbage bytes before SUL", sul_tell);
    }

    let mut label_bytes = [0u8; SUL_SIZE];
    source.read_at(&mut label_bytes, sul_tell as u64)?;
    let label = StorageUnitLabel::parse(&label_bytes)?;

    println!("storage unit label:");
    println!("    sequence-number: {}", label.sequence);
    println!("    version: V{}.{}", label.major, label.minor);
    println!("    layout: {}", label.layout);
    println!("    id: {}", label.id);

    let after_label = (sul_tell + SUL_SIZE) as u64;
    let window_len = source.size().saturating_sub(after_label).min(200);
    let mut window = vec![0u8; window_len as usize];
    source.read_at(&mut window, after_label)?;
    let vrl_offset = envelope::find_vrl(&window, 0)?;
    if vrl_offset != 0 {
        eprintln!(
            "{} garbage bytes between SUL and first visible envelope",
            vrl_offset
        );
    }

    let mut vrl_bytes = [0u8; VRL_SIZE];
    source.read_at(&mut vrl_bytes, after_label + vrl_offset as u64)?;
    let vrl = VisibleRecordHeader::parse(&vrl_bytes, after_label + vrl_offset as u64)?;

    println!("visible envelope (VRL):");
    println!("    length: {}", vrl.length);
    println!("    pad-byte: {:#04x}", vrl.pad_byte);
    println!("    version: {}", vrl.version);

    Ok(())
}
