use std::{env, fs, io};

use wsq::container::stream::read_stream;
use wsq::{MetadataStore, NistCom};

fn parse_args() -> Result<String, Box<dyn std::error::Error>> {
    let mut args = env::args().collect::<Vec<String>>();
    if args.len() < 2 {
        return Err(Box::new(io::Error::new(
            io::ErrorKind::InvalidInput,
            "usage: wsq <file.wsq>",
        )));
    }
    Ok(args.remove(1))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let input = parse_args()?;
    let contents = fs::read(&input)?;
    let stream = read_stream(&contents)?;

    println!("{input}: {}x{} pixels", stream.frame.width, stream.frame.height);
    match wsq::ppi(&contents)? {
        Some(ppi) => println!("resolution: {ppi} ppi"),
        None => println!("resolution: unknown"),
    }

    println!("segments:");
    for segment in &stream.segments {
        match segment.length {
            Some(length) => println!(
                "  {:>8}  {}  length {length}",
                segment.offset, segment.marker
            ),
            None => println!("  {:>8}  {}", segment.offset, segment.marker),
        }
    }

    println!("blocks:");
    for (i, block) in stream.block_info.iter().enumerate() {
        println!(
            "  {}: table {}, {} coded bytes, {} coefficients",
            i + 1,
            block.table_id,
            block.coded_len,
            block.coefficients
        );
    }

    for comment in &stream.tables.comments {
        if NistCom::is_nistcom(comment) {
            let nistcom = NistCom::from_comment(comment)?;
            println!("NISTCOM ({} fields):", nistcom.len());
            for line in nistcom.format().lines() {
                println!("  {line}");
            }
        } else {
            println!("comment: {}", String::from_utf8_lossy(comment));
        }
    }
    Ok(())
}
