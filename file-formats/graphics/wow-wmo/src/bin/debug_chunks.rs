use std::env;
use std::fs::File;
use std::io::{BufReader, Write};

use tracing::warn;
use wow_data::chunk::{ChunkReader, TagOrder, read_chunks};
use wow_wmo::chunks::MOGP;
use wow_wmo::root::describe;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Some(path) = env::args().nth(1) else {
        return Err("usage: debug_chunks <wmo-file>".into());
    };

    let reader = BufReader::new(File::open(path)?);
    let mut out = std::io::stdout().lock();

    writeln!(out, "{:<8} {:<12} {:<10} Contents", "ID", "Offset", "Size")?;
    writeln!(out, "{:-<48}", "")?;

    for chunk in ChunkReader::new(reader, TagOrder::Reversed)? {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!("stopped: {e}");
                break;
            }
        };
        writeln!(
            out,
            "{:<8} 0x{:08X}   {:<10} {}",
            chunk.tag.as_str(),
            chunk.offset,
            chunk.data.len(),
            describe(chunk.tag)
        )?;

        if chunk.tag == MOGP && chunk.data.len() >= 68 {
            let base = chunk.payload_offset() + 68;
            for sub in read_chunks(&chunk.data[68..], TagOrder::Reversed)? {
                writeln!(
                    out,
                    "  {:<6} 0x{:08X}   {:<10}",
                    sub.tag.as_str(),
                    base + sub.offset,
                    sub.data.len()
                )?;
            }
        }
    }

    Ok(())
}
