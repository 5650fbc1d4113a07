// Copyright 2017-2026 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

/*! The main fitsutils driver command

Each sub-command stands in for one of the small pipeline scripts: combining
LDAC catalogs, splitting SCAMP head files, assembling MEFs, printing
headers, and computing special metadata.

*/

use anyhow::{anyhow, Context, Result};
use clap::{crate_version, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use fitsutils_core::names::NameSource;
use fitsutils_core::notify::{run_with_notifications, ClapNotificationArgsExt, NotificationBackend};
use fitsutils_core::{fu_debug, fu_note};
use fitsutils_fits::catalogs::combine_cats;
use fitsutils_fits::mef::MefBuilder;
use fitsutils_fits::{read_header, FitsFile, HduSelector};
use fitsutils_metadata::SpecialKey;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

fn main() {
    let matches = make_app().get_matches();
    process::exit(run_with_notifications(matches, |matches, nbe| dispatch(&matches, nbe)));
}

fn dispatch(matches: &ArgMatches, nbe: &mut dyn NotificationBackend) -> Result<i32> {
    match matches.subcommand() {
        Some(("combine-cats", m)) => do_combine_cats(m, nbe),
        Some(("split-head", m)) => do_split_head(m, nbe),
        Some(("make-mef", m)) => do_make_mef(m, nbe),
        Some(("print-header", m)) => do_print_header(m, &mut io::stdout().lock()),
        Some(("metadata", m)) => do_metadata(m, &mut io::stdout().lock()),
        _ => {
            make_app().print_long_help()?;
            Ok(0)
        }
    }
}

fn selector_arg() -> Arg {
    Arg::new("extension")
        .short('x')
        .long("extension")
        .value_name("EXT")
        .help("The HDU to use: a zero-based index, or an EXTNAME such as LDAC_IMHEAD")
        .value_parser(|s: &str| s.parse::<HduSelector>())
}

/// It's handy to be able to make the Command more than once, so that help
/// can be re-printed.
fn make_app() -> Command {
    Command::new("fitsutils")
        .version(crate_version!())
        .about("Utilities for FITS files in the DES pipeline")
        .fitsutils_notify_args()
        .subcommand(
            Command::new("combine-cats")
                .about("Combine LDAC catalogs into a single file")
                .arg(
                    Arg::new("outcat")
                        .long("outcat")
                        .value_name("PATH")
                        .help("The combined output catalog")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("list")
                        .long("list")
                        .value_name("PATH")
                        .help("A file listing the input catalogs, one per line")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("incats")
                        .long("incats")
                        .value_name("A,B,...")
                        .help("Comma-separated input catalogs"),
                )
                .group(ArgGroup::new("inputs").args(["list", "incats"]).required(true)),
        )
        .subcommand(
            Command::new("split-head")
                .about("Split a SCAMP head file into one head file per catalog")
                .arg(
                    Arg::new("in")
                        .long("in")
                        .value_name("PATH")
                        .help("The head file to split")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("list")
                        .long("list")
                        .value_name("PATH")
                        .help("A file listing the output names; order must match the head file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("A,B,...")
                        .help("Comma-separated output names; order must match the head file"),
                )
                .group(ArgGroup::new("outputs").args(["list", "out"]).required(true)),
        )
        .subcommand(
            Command::new("make-mef")
                .about("Create a MEF FITS file from a list of single-image FITS files")
                .arg(
                    Arg::new("filenames")
                        .value_name("FILE")
                        .help("The input FITS files to use")
                        .num_args(0..)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("outname")
                        .long("outname")
                        .value_name("PATH")
                        .help("The output FITS file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("extnames")
                        .long("extnames")
                        .value_name("NAME")
                        .help("The EXTNAME to use for each file")
                        .num_args(0..),
                )
                .arg(
                    Arg::new("clobber")
                        .long("clobber")
                        .help("Overwrite the output file if it exists")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("print-header")
                .about("Print a FITS header to standard output or to a file")
                .arg(
                    Arg::new("fitsfile")
                        .value_name("FITSFILE")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("outfile")
                        .short('o')
                        .long("outfile")
                        .value_name("PATH")
                        .help("Print the header to this file")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(selector_arg().default_value("0")),
        )
        .subcommand(
            Command::new("metadata")
                .about("Compute special metadata values from a FITS file")
                .arg(
                    Arg::new("fitsfile")
                        .value_name("FITSFILE")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("keys")
                        .value_name("KEY")
                        .help("band, camsym, nite, objects, field, radeg, tradeg, decdeg, or tdecdeg")
                        .required(true)
                        .num_args(1..),
                )
                .arg(selector_arg()),
        )
}

/// Build a name list from whichever of two mutually exclusive options was
/// given.
fn name_source(m: &ArgMatches, list_arg: &str, names_arg: &str) -> Result<NameSource> {
    if let Some(p) = m.get_one::<PathBuf>(list_arg) {
        return Ok(NameSource::File(p.clone()));
    }

    match m.get_one::<String>(names_arg) {
        Some(s) => Ok(NameSource::List(s.clone())),
        None => Err(anyhow!("one of --{} or --{} must be given", list_arg, names_arg)),
    }
}

fn resolve_names(source: &NameSource) -> Result<Vec<String>> {
    match source {
        NameSource::File(p) => source
            .resolve()
            .with_context(|| format!("cannot read list file `{}`", p.display())),
        NameSource::List(_) => Ok(source.resolve()?),
    }
}

fn do_combine_cats(m: &ArgMatches, nbe: &mut dyn NotificationBackend) -> Result<i32> {
    let outcat = m
        .get_one::<PathBuf>("outcat")
        .ok_or_else(|| anyhow!("no output catalog given"))?;
    let incats = resolve_names(&name_source(m, "list", "incats")?)?;

    fu_note!(nbe, "combining catalogs into {}", outcat.display());
    let n = combine_cats(&incats, outcat, nbe)
        .with_context(|| format!("failed to combine catalogs into `{}`", outcat.display()))?;
    fu_debug!(nbe, "wrote {} HDUs", n);
    Ok(0)
}

fn do_split_head(m: &ArgMatches, nbe: &mut dyn NotificationBackend) -> Result<i32> {
    let input = m
        .get_one::<PathBuf>("in")
        .ok_or_else(|| anyhow!("no head file given"))?;
    let outheads = resolve_names(&name_source(m, "list", "out")?)?;

    fu_note!(nbe, "splitting {} into {}", input.display(), outheads.join(","));
    let summary = fitsutils_scamp::split_head_file(input, &outheads, nbe)
        .with_context(|| format!("failed to split `{}`", input.display()))?;
    fu_debug!(nbe, "wrote {} head files", summary.n_blocks());
    Ok(0)
}

fn do_make_mef(m: &ArgMatches, nbe: &mut dyn NotificationBackend) -> Result<i32> {
    let outname = m
        .get_one::<PathBuf>("outname")
        .ok_or_else(|| anyhow!("must provide output file name"))?;

    let filenames = m
        .get_many::<PathBuf>("filenames")
        .map(|v| v.cloned().collect::<Vec<_>>())
        .unwrap_or_default();

    let extnames = m
        .get_many::<String>("extnames")
        .map(|v| v.cloned().collect::<Vec<_>>())
        .unwrap_or_default();

    let wrote = MefBuilder::new(outname)
        .inputs(filenames)
        .extnames(extnames)
        .clobber(m.get_flag("clobber"))
        .write(nbe)
        .with_context(|| format!("failed to create MEF `{}`", outname.display()))?;

    if wrote {
        fu_debug!(nbe, "wrote {}", outname.display());
    }

    Ok(0)
}

fn do_print_header<W: Write>(m: &ArgMatches, stdout: &mut W) -> Result<i32> {
    let path = m
        .get_one::<PathBuf>("fitsfile")
        .ok_or_else(|| anyhow!("no FITS file given"))?;
    let selector = m.get_one::<HduSelector>("extension");

    let header = read_header(path, selector)
        .with_context(|| format!("cannot read header of `{}`", path.display()))?;

    match m.get_one::<PathBuf>("outfile") {
        Some(outfile) => {
            let mut f = fs::File::create(outfile)
                .with_context(|| format!("cannot open `{}`", outfile.display()))?;
            writeln!(f, "{header}")?;
        }

        None => {
            writeln!(stdout, "{header}")?;
        }
    }

    Ok(0)
}

fn do_metadata<W: Write>(m: &ArgMatches, stdout: &mut W) -> Result<i32> {
    let path = m
        .get_one::<PathBuf>("fitsfile")
        .ok_or_else(|| anyhow!("no FITS file given"))?;
    let selector = m.get_one::<HduSelector>("extension");

    let keys = m
        .get_many::<String>("keys")
        .into_iter()
        .flatten()
        .map(|k| k.parse::<SpecialKey>())
        .collect::<Result<Vec<_>, _>>()?;

    let mut file = FitsFile::open(path).with_context(|| format!("cannot open `{}`", path.display()))?;

    for key in keys {
        let value = fitsutils_metadata::compute(key, &mut file, selector)
            .with_context(|| format!("cannot compute `{}` for `{}`", key, path.display()))?;
        writeln!(stdout, "{key} = {value}")?;
    }

    Ok(0)
}
