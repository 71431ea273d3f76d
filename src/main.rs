use std::process;

use step6502::config::{parse_args, Command, Config, RunMode, USAGE};
use step6502::disassembler::disassemble;
use step6502::loader::Image;
use step6502::server::{run_server, AppState};
use step6502::CPU;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = match parse_args(&args) {
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return;
        }
        Ok(Command::Run(config)) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    let image = match Image::read(&config) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match config.mode {
        RunMode::Headless { cycles, trace } => run_headless(&config, image, cycles, trace),
        RunMode::Serve { port } => {
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(runtime) => runtime,
                Err(e) => {
                    eprintln!("Error starting runtime: {}", e);
                    process::exit(1);
                }
            };
            runtime.block_on(run_server(AppState::new(Some(image)), port));
        }
    }
}

fn run_headless(config: &Config, image: Image, cycles: u64, trace: bool) {
    let mut cpu = CPU::new();
    let loaded = image.load_into(&mut cpu);
    cpu.reset();

    println!(
        "Loaded {} bytes from {} at ${:04X}",
        loaded,
        config.image_path.display(),
        image.offset
    );

    for _ in 0..cycles {
        if trace && cpu.wait_cycles() == 0 {
            print_trace(&cpu);
        }
        cpu.tick();
    }

    println!("CPU State:");
    println!("A: ${:02X}", cpu.get_register_a());
    println!("X: ${:02X}", cpu.get_register_x());
    println!("Y: ${:02X}", cpu.get_register_y());
    println!("PC: ${:04X}", cpu.get_pc());
    println!("SP: ${:02X}", cpu.get_sp());
    println!("Status: ${:02X}", cpu.get_status());
    println!("Cycles: {}", cpu.cycles());
    println!("Instructions: {}", cpu.instructions());
}

// One line per fetch, printed before the instruction runs
fn print_trace(cpu: &CPU) {
    let instruction = disassemble(cpu.memory(), cpu.get_pc());
    println!(
        "{:04X}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{:<6} {}",
        cpu.get_pc(),
        cpu.get_register_a(),
        cpu.get_register_x(),
        cpu.get_register_y(),
        cpu.get_status(),
        cpu.get_sp(),
        cpu.cycles(),
        instruction.text()
    );
}
