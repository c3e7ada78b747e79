//! Runs a raw program image on the CPU core and prints a nestest-style log.
//!
//! For nestest.nes:
//!
//! ```text
//! nescpu-trace nestest.nes --offset 10 --length 4000 --entry C000 --reference nestest.log
//! ```

use nescpu::cpu::trace::{format_nestest_line, strip_ppu_column, LogTracer};
use nescpu::memory::{Bus, MemoryChunk, Ram, Rom};
use nescpu::ppu::PpuRegisters;
use nescpu::{Cpu, Error};

use clap::{App, Arg, ArgMatches};
use itertools::Itertools;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::rc::Rc;

const IO_REGISTERS_START: u16 = 0x4000;
const IO_REGISTERS_SIZE: usize = 0x20;
const PRG_RAM_START: u16 = 0x6000;
const PRG_RAM_SIZE: usize = 0x2000;

fn invalid_input(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

fn hex_arg(matches: &ArgMatches, name: &str) -> io::Result<Option<u32>> {
    match matches.value_of(name) {
        Some(text) => {
            let digits = text.trim_start_matches("0x").trim_start_matches('$');
            u32::from_str_radix(digits, 16)
                .map(Some)
                .map_err(|e| invalid_input(format!("--{} {}: {}", name, text, e)))
        }
        None => Ok(None),
    }
}

fn address_arg(matches: &ArgMatches, name: &str) -> io::Result<Option<u16>> {
    match hex_arg(matches, name)? {
        Some(value) if value > 0xFFFF => Err(invalid_input(format!("--{} {:#x} is above $FFFF", name, value))),
        value => Ok(value.map(|v| v as u16)),
    }
}

fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("nescpu-trace")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Execute a program image and print one nestest-format line per instruction")
        .arg(
            Arg::with_name("image")
                .value_name("nestest.nes")
                .index(1)
                .required(true)
                .help("Raw file holding the program"),
        )
        .arg(
            Arg::with_name("offset")
                .long("offset")
                .value_name("10")
                .takes_value(true)
                .help("Hex offset of the program within the file"),
        )
        .arg(
            Arg::with_name("length")
                .long("length")
                .value_name("4000")
                .takes_value(true)
                .help("Hex length of the program; defaults to the rest of the file"),
        )
        .arg(
            Arg::with_name("load_address")
                .long("load-address")
                .value_name("8000")
                .takes_value(true)
                .help("Hex address the program is mapped at; it is mirrored up to $FFFF"),
        )
        .arg(
            Arg::with_name("entry")
                .long("entry")
                .value_name("C000")
                .takes_value(true)
                .help("Hex start address; defaults to the reset vector"),
        )
        .arg(
            Arg::with_name("steps")
                .long("steps")
                .value_name("8991")
                .takes_value(true)
                .help("Stop after this many instructions"),
        )
        .arg(
            Arg::with_name("reference")
                .long("reference")
                .value_name("nestest.log")
                .takes_value(true)
                .help("Log to compare against, ignoring the PPU column"),
        )
}

fn load_program(matches: &ArgMatches) -> io::Result<Vec<u8>> {
    let path = matches.value_of("image").unwrap_or_default();
    let image = fs::read(path)?;
    let offset = hex_arg(matches, "offset")?.unwrap_or(0) as usize;
    let length = hex_arg(matches, "length")?
        .map(|l| l as usize)
        .unwrap_or_else(|| image.len().saturating_sub(offset));

    if length == 0 || offset + length > image.len() {
        return Err(invalid_input(format!(
            "{:#x} bytes at offset {:#x} do not fit in {} ({:#x} bytes)",
            length,
            offset,
            path,
            image.len()
        )));
    }
    Ok(image[offset..offset + length].to_vec())
}

fn console(program: Vec<u8>, load_address: u16) -> (Cpu, Rc<RefCell<PpuRegisters>>) {
    let ppu = Rc::new(RefCell::new(PpuRegisters::new()));
    let window = 0x10000 - load_address as u32;
    let chunks: Vec<Box<dyn MemoryChunk>> = vec![
        Box::new(Ram::default()),
        Box::new(ppu.clone()),
        Box::new(Ram::new(IO_REGISTERS_START, IO_REGISTERS_SIZE)),
        Box::new(Ram::new(PRG_RAM_START, PRG_RAM_SIZE)),
        Box::new(Rom::mirrored(load_address, program, window)),
    ];
    (Cpu::new(Bus::with_chunks(chunks)), ppu)
}

fn read_reference(path: &str) -> io::Result<Vec<String>> {
    let file = fs::File::open(path)?;
    BufReader::new(file)
        .lines()
        .map(|line| line.map(|l| strip_ppu_column(&l)))
        .filter_ok(|l| !l.is_empty())
        .collect()
}

fn main() -> io::Result<()> {
    env_logger::init();
    let matches = app().get_matches();

    let program = load_program(&matches)?;
    let load_address = hex_arg(&matches, "load_address")?.unwrap_or(0x8000);
    if load_address < PRG_RAM_START as u32 + PRG_RAM_SIZE as u32 || load_address > 0xFFFF {
        return Err(invalid_input(format!("--load-address {:#x} is outside $8000-$FFFF", load_address)));
    }
    let reference = match matches.value_of("reference") {
        Some(path) => Some(read_reference(path)?),
        None => None,
    };
    let steps = match matches.value_of("steps") {
        Some(text) => Some(text.parse::<usize>().map_err(|e| invalid_input(format!("--steps {}: {}", text, e)))?),
        None => reference.as_ref().map(|r| r.len()),
    };

    debug!("Loaded {:#x} program bytes at {:#06x}", program.len(), load_address);
    let (mut cpu, ppu) = console(program, load_address as u16);
    cpu.reset()?;
    if let Some(entry) = address_arg(&matches, "entry")? {
        cpu.program_counter = entry;
    }
    cpu.set_tracer(LogTracer);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut executed = 0;
    while steps.map_or(true, |limit| executed < limit) {
        let step = match cpu.step() {
            Ok(step) => step,
            Err(err @ Error::UnknownOpcode { .. }) => {
                warn!("Halted: {}", err);
                break;
            }
            Err(err) => return Err(err.into()),
        };
        let line = format_nestest_line(&step);
        writeln!(out, "{}", line)?;

        if let Some(expected) = reference.as_ref().and_then(|r| r.get(executed)) {
            let actual = strip_ppu_column(&line);
            if actual != *expected {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("line {} differs\nexpected: {}\n  actual: {}", executed + 1, expected, actual),
                ));
            }
        }
        executed += 1;
    }

    info!(
        "Executed {} instructions in {} cycles; PPUCTRL {:#04x}, PPUMASK {:#04x}",
        executed,
        cpu.cycle,
        ppu.borrow().ctrl.0,
        ppu.borrow().mask.0
    );
    if let Some(reference) = reference {
        if executed < reference.len() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("stopped after {} of {} reference lines", executed, reference.len()),
            ));
        }
        info!("All {} lines match the reference", executed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_arguments() -> io::Result<()> {
        let matches = app().get_matches_from(vec!["nescpu-trace", "image.bin", "--offset", "0x10", "--entry", "$C000"]);
        assert_eq!(hex_arg(&matches, "offset")?, Some(0x10));
        assert_eq!(hex_arg(&matches, "entry")?, Some(0xC000));
        assert_eq!(hex_arg(&matches, "length")?, None);

        let matches = app().get_matches_from(vec!["nescpu-trace", "image.bin", "--length", "zz"]);
        assert_eq!(hex_arg(&matches, "length").unwrap_err().kind(), io::ErrorKind::InvalidInput);
        Ok(())
    }

    #[test]
    fn test_entry_above_address_space_is_rejected() -> io::Result<()> {
        let matches = app().get_matches_from(vec!["nescpu-trace", "image.bin", "--entry", "1C000"]);
        assert_eq!(address_arg(&matches, "entry").unwrap_err().kind(), io::ErrorKind::InvalidInput);

        let matches = app().get_matches_from(vec!["nescpu-trace", "image.bin", "--entry", "FFFF"]);
        assert_eq!(address_arg(&matches, "entry")?, Some(0xFFFF));
        Ok(())
    }

    #[test]
    fn test_console_mirrors_program_to_top_of_memory() -> io::Result<()> {
        let mut bank = vec![0xEA; 0x4000];
        bank[0x3FFC] = 0x00;
        bank[0x3FFD] = 0xC0;
        let (mut cpu, _) = console(bank, 0x8000);
        cpu.reset()?;
        assert_eq!(cpu.program_counter, 0xC000);
        assert_eq!(cpu.bus.peek(0x8000)?, 0xEA);
        cpu.bus.write(0x6000, 0x42)?;
        cpu.bus.write(0x4015, 0x0F)?;
        assert_eq!(cpu.bus.peek(0x6000)?, 0x42);
        assert_eq!(cpu.bus.peek(0x4015)?, 0x0F);
        assert_eq!(cpu.step()?.cycles, 2);
        Ok(())
    }
}
