use std::{
    f32::consts::PI,
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vgir::RefCounted as _;
use vgir::render::{IrPictureRecorder, RecordingSceneBuilder, TracingLogger};

#[derive(Parser, Debug)]
#[command(name = "vgir", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a sample drawing and print its disassembly.
    Demo(DemoArgs),
    /// Disassemble an instruction dump.
    Disasm(DisasmArgs),
}

#[derive(Parser, Debug)]
struct DemoArgs {
    /// Configuration JSON (pool, canvas and cache options).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the recorded buffers to this dump file.
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Print the heap allocation profile of the recording.
    #[arg(long)]
    profile: bool,
}

#[derive(Parser, Debug)]
struct DisasmArgs {
    /// Dump file written by `vgir demo --dump`.
    file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Demo(args) => cmd_demo(args),
        Command::Disasm(args) => cmd_disasm(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<vgir::VgirConfig> {
    match path {
        Some(p) => vgir::VgirConfig::from_path(p)
            .with_context(|| format!("load config '{}'", p.display())),
        None => Ok(vgir::VgirConfig::default()),
    }
}

/// Five-pointed star inscribed in a circle of radius `r` around (`cx`, `cy`).
fn star_path(canvas: &vgir::Canvas, cx: f32, cy: f32, r: f32) -> vgir::VgirResult<vgir::Path> {
    let path = vgir::Path::new(canvas)?;
    for i in 0..5 {
        let theta = -PI / 2.0 + (i as f32) * 4.0 * PI / 5.0;
        let (x, y) = (cx + r * theta.cos(), cy + r * theta.sin());
        if i == 0 {
            path.move_to(x, y)?;
        } else {
            path.line_to(x, y)?;
        }
    }
    path.close()?;
    Ok(path)
}

fn record_demo(canvas: &mut vgir::Canvas) -> vgir::VgirResult<()> {
    canvas.clear(vgir::color_argb(255, 18, 20, 28))?;

    let fill = vgir::Paint::new(canvas)?;
    fill.set_antialias(true)?;
    let gradient = vgir::Shader::linear_gradient(
        vgir::Point::new(0.0, 0.0),
        vgir::Point::new(200.0, 200.0),
        &[0xffff_c107, 0xffe9_1e63],
        None,
        vgir::ir::constants::TileMode::Clamp,
    )?;
    fill.set_shader(Some(&gradient))?;
    let star = star_path(canvas, 100.0, 100.0, 80.0)?;
    canvas.draw_path(&star, &fill)?;

    let stroke = vgir::Paint::new(canvas)?;
    stroke.set_style_stroke(true)?;
    stroke.set_stroke_width(4.0)?;
    stroke.set_color(0xffff_ffff)?;
    let dash = vgir::PathEffect::dash(&[8.0, 4.0], 0.0)?;
    stroke.set_path_effect(Some(&dash))?;
    canvas.draw_circle(vgir::Point::new(100.0, 100.0), 90.0, &stroke)?;

    star.unref()?;
    gradient.unref()?;
    dash.unref()?;
    fill.unref()?;
    stroke.unref()
}

/// Two linearization passes over a small tree; the second one is served from the cache.
fn linearize_demo(cfg: &vgir::VgirConfig) -> anyhow::Result<()> {
    let mut tree = vgir::RenderTree::new();
    let root = tree.new_composite();
    tree.attributes_mut(root)?.set_opacity(0.8)?;
    for i in 0..2 {
        let p = tree.new_painter();
        let x = f64::from(i) * 50.0;
        tree.update_painter(p, vgir::Rect::new(x, 0.0, x + 50.0, 50.0), move |c| {
            let paint = vgir::Paint::new(c)?;
            paint.set_color(0xff20_80f0 + i)?;
            c.draw_circle(vgir::Point::new(25.0, 25.0), 20.0, &paint)?;
            paint.unref()
        })?;
        tree.append_child(root, p)?;
    }

    let mut ctx = vgir::LinearizationContext::with_opts(cfg.cache)?;
    let mut pictures = IrPictureRecorder::new(
        vgir::MemoryResourceGroup::with_opts(cfg.pool)?,
        cfg.canvas.clone(),
        vgir::DecodingCompiler::new(),
    );
    for pass in 0..2 {
        let scene = tree.compose(root)?.generate(
            &mut tree,
            vgir::Size::new(100.0, 50.0),
            &mut ctx,
            &mut pictures,
            &mut RecordingSceneBuilder::new(),
            &mut TracingLogger::new(),
        )?;
        println!(
            "pass {pass}: {} scene calls, {} pictures recorded so far",
            scene.commands.len(),
            pictures.recorded()
        );
    }
    let stats = ctx.stats();
    println!(
        "cache: {} entries, {} hits, {} misses, {} evictions",
        ctx.len(),
        stats.hits,
        stats.misses,
        stats.evictions
    );
    Ok(())
}

fn cmd_demo(args: DemoArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let group = vgir::MemoryResourceGroup::with_opts(cfg.pool)?;
    let mut opts = cfg.canvas.clone();
    opts.heap_profiling |= args.profile;

    let mut canvas = vgir::Canvas::with_opts(&group, 200.0, 200.0, opts)?;
    record_demo(&mut canvas)?;
    canvas.finish()?;

    print!("{}", canvas.disassemble()?);

    if let Some(out) = &args.dump {
        let f = File::create(out).with_context(|| format!("create dump '{}'", out.display()))?;
        let mut w = BufWriter::new(f);
        canvas.with_buffers(|buffers| vgir::ir::dump::write_dump(buffers, &mut w))??;
        w.flush()
            .with_context(|| format!("write dump '{}'", out.display()))?;
        eprintln!("wrote {}", out.display());
    }

    let picture = canvas.submit(&mut vgir::DecodingCompiler::new())?;
    if let Some(p) = &picture.profile {
        println!(
            "heap: {} allocations, {} frees, peak {} live, {} leaked",
            p.allocations,
            p.frees,
            p.peak_live,
            p.leaked.len()
        );
    }
    canvas.dispose()?;

    linearize_demo(&cfg)
}

fn cmd_disasm(args: DisasmArgs) -> anyhow::Result<()> {
    let f = File::open(&args.file)
        .with_context(|| format!("open dump '{}'", args.file.display()))?;
    let buffers = vgir::ir::dump::read_dump(BufReader::new(f))
        .with_context(|| format!("read dump '{}'", args.file.display()))?;
    let slices: Vec<&[u8]> = buffers.iter().map(Vec::as_slice).collect();
    print!("{}", vgir::ir::disasm::disassemble(&slices)?);
    Ok(())
}
