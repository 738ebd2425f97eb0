use clap::Parser;
use std::path::PathBuf;
use wildgen::{GenTypeTable, WorldParams, generate_overworld, render};

/// Генератор надмирья для тайловых рогаликов
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу TOML (без него — значения по умолчанию)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Сид генерации (перекрывает значение из конфига)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Путь к справочнику типов генерации TOML (без него — встроенный)
    #[arg(short = 't', long)]
    gen_types: Option<PathBuf>,

    /// Путь для сохранения карты (по умолчанию: ./map.png)
    #[arg(short, long, default_value = "map.png")]
    output: PathBuf,

    /// Путь для JSON со списком мест
    #[arg(short, long, default_value = "places.json")]
    places: PathBuf,

    /// Масштаб рендера: пикселей на макроблок
    #[arg(long, default_value_t = 8)]
    scale: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    println!("🔍 Загрузка конфигурации...");
    let mut params = match &cli.config {
        Some(path) => WorldParams::from_toml_file(path.to_str().unwrap())?,
        None => WorldParams::default(),
    };
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }

    let table = match &cli.gen_types {
        Some(path) => GenTypeTable::from_toml_file(path.to_str().unwrap())?,
        None => GenTypeTable::default(),
    };
    for warning in table.validate() {
        println!("⚠ Справочник: {warning}");
    }

    println!(
        "Генерация надмирья (сетка {}×{}, сид {})...",
        params.size, params.size, params.seed
    );
    let map = generate_overworld(&params, &table);
    let (sx, sy) = map.starting_position();
    println!("Мест размещено: {}, старт на ({sx}, {sy})", map.places().len());

    println!("Сохранение карты в {:?}", cli.output);
    render::save_as_png(&map, cli.output.to_str().unwrap(), cli.scale)?;

    let json = serde_json::to_string_pretty(map.places())?;
    std::fs::write(&cli.places, json)?;
    println!("\nГотово! Карта и список мест сохранены.");
    Ok(())
}
