use std::hint::black_box;

use core_restore::{FlagSet, RestoreOptions, Variant, restore};
use criterion::{Criterion, criterion_group, criterion_main};

/// Eight variants over three flags with a mix of shared and guarded lines,
/// sized so the expression search dominates the run.
fn build_variants() -> Vec<Variant> {
    let mut variants = Vec::new();
    for fog in ["On", "Off"] {
        for pass in ["Opaque", "Transparent"] {
            for detail in ["Low", "High"] {
                let mut code = String::from("init();\nsetup();\n");
                if fog == "On" {
                    code.push_str("fog();\n");
                }
                if pass == "Transparent" {
                    code.push_str("blend();\n");
                }
                if detail == "High" {
                    code.push_str("detail_pass();\n");
                }
                if fog == "On" && pass == "Transparent" {
                    code.push_str("fog_blend();\n");
                }
                code.push_str("finish();\n");
                let flags: FlagSet = [("pass", pass), ("f_Fog", fog), ("f_Detail", detail)]
                    .into_iter()
                    .collect();
                variants.push(Variant::new(flags, code));
            }
        }
    }
    variants
}

fn bench_restore(c: &mut Criterion) {
    let variants = build_variants();
    let options = RestoreOptions {
        search_timeout: None,
        ..RestoreOptions::default()
    };
    c.bench_function("restore_eight_variants", |b| {
        b.iter(|| restore(black_box(&variants), &options))
    });
}

criterion_group!(benches, bench_restore);
criterion_main!(benches);
