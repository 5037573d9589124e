use std::env;

use anyhow::Context;
use ethernity_codestream::{CodeStream, CodeStreamConfig};
use ethernity_core::opcodes::{push_width, JUMPDEST};
use tracing::info;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Uso: {} <BYTECODE_HEX> [CONFIG_JSON]", args[0]);
        std::process::exit(1);
    }

    let config = match args.get(2) {
        Some(raw) => CodeStreamConfig::from_json(raw).context("configuração inválida")?,
        None => CodeStreamConfig::default(),
    };
    let mut stream =
        CodeStream::from_hex_with_config(&args[1], &config).context("bytecode inválido")?;
    info!("Bytecode com {} bytes", stream.len());

    // Percorre o código como o loop de execução, usando o classificador
    // para pular os bytes de dados de cada PUSH
    while stream.position() < stream.len() {
        let pc = stream.position();
        if !stream.is_valid_opcode(pc) {
            stream.set_position(pc + 1);
            continue;
        }
        let opcode = stream.next_opcode();
        let marker = if opcode == JUMPDEST { " <- JUMPDEST" } else { "" };
        match push_width(opcode) {
            Some(width) => {
                let data = stream.read(width);
                println!("{:>6}: 0x{:02x} PUSH{} 0x{}", pc, opcode, width, hex::encode(data));
            }
            None => println!("{:>6}: 0x{:02x}{}", pc, opcode, marker),
        }
    }

    if let Some(position) = stream.truncated_push() {
        println!("PUSH na posição {} termina após o fim do código", position);
    }
    stream.analyze();
    let stats = stream.stats();
    println!("\nOpcodes válidos: {}", stats.valid);
    println!("Bytes de dados: {}", stats.invalid);
    Ok(())
}
