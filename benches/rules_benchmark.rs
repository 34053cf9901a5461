use benchlens::catalog::{Controls, LoadOptions};
use benchlens::rules::engine::RulesEngine;
use benchlens::rules::{compare, BinOp, Check, ProbeOutputs, TestItem, TestSet};
use benchlens::utils::command::StaticProbe;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// Build a catalog with `groups` groups of `checks` checks sharing one probe
fn create_catalog(groups: usize, checks: usize) -> Controls {
    let mut yaml = String::from("id: 1\ntext: \"Control Plane\"\ntype: master\ngroups:\n");
    for g in 0..groups {
        yaml.push_str(&format!("  - id: 1.{g}\n    text: \"Group {g}\"\n    checks:\n"));
        for c in 0..checks {
            yaml.push_str(&format!(
                "      - id: 1.{g}.{c}\n        text: \"Check {c}\"\n        audit: \"ps apiserver\"\n        audit_config: \"cat config\"\n        tests:\n          bin_op: or\n          test_items:\n            - flag: \"--flag-{c}\"\n              path: '{{.settings.flag{c}}}'\n              compare:\n                op: eq\n                value: \"true\"\n            - flag: \"--profiling\"\n              set: false\n        scored: true\n"
            ));
        }
    }
    Controls::parse(&yaml, &LoadOptions::default()).unwrap()
}

fn create_probe(flags: usize) -> StaticProbe {
    let mut cmdline = String::from("kube-apiserver");
    let mut config = String::from("settings:\n");
    for i in 0..flags {
        if i % 2 == 0 {
            cmdline.push_str(&format!(" --flag-{i}=true"));
        } else {
            config.push_str(&format!("  flag{i}: true\n"));
        }
    }
    StaticProbe::new()
        .with_output("ps apiserver", cmdline)
        .with_output("cat config", config)
}

fn benchmark_comparisons(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");

    let cases = [
        ("eq", "false", "false"),
        ("gte", "65536", "1024"),
        ("has", "Node,RBAC,NodeRestriction", "RBAC"),
        ("regex", "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256", "^TLS_ECDHE_.*_GCM_"),
        (
            "valid_elements",
            "TLS_AES_128_GCM_SHA256,TLS_AES_256_GCM_SHA384",
            "TLS_AES_128_GCM_SHA256,TLS_AES_256_GCM_SHA384,TLS_CHACHA20_POLY1305_SHA256",
        ),
        ("bitmask", "600", "644"),
    ];

    for (op, observed, expected) in cases {
        group.bench_with_input(BenchmarkId::from_parameter(op), &op, |b, &op| {
            b.iter(|| compare(black_box(op), black_box(observed), black_box(expected), "flag"))
        });
    }

    group.finish();
}

fn benchmark_check_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_evaluation");

    let check = Check {
        audit: "ps apiserver".to_string(),
        use_multiple_values: true,
        scored: true,
        tests: Some(TestSet::new(
            vec![TestItem::flag("permissions").with_compare("bitmask", "644")],
            BinOp::And,
        )),
        ..Check::new("1.1.1", "Ensure manifest permissions")
    };

    for lines in [1usize, 10, 100] {
        let output = (0..lines)
            .map(|i| format!("permissions={}", if i % 2 == 0 { "600" } else { "640" }))
            .collect::<Vec<_>>()
            .join("\n");
        let outputs = ProbeOutputs::primary(output);

        group.bench_with_input(BenchmarkId::new("lines", lines), &outputs, |b, outputs| {
            b.iter(|| check.evaluate(black_box(outputs)))
        });
    }

    let config_check = Check {
        audit: "ps kubelet".to_string(),
        scored: true,
        tests: Some(TestSet::new(
            vec![TestItem::flag("--anonymous-auth")
                .with_path("{.authentication.anonymous.enabled}")
                .with_compare("eq", "false")],
            BinOp::And,
        )),
        ..Check::new("4.2.1", "Ensure anonymous auth is disabled")
    };
    let outputs = ProbeOutputs::primary("kubelet --config=/var/lib/kubelet/config.yaml")
        .with_config("authentication:\n  anonymous:\n    enabled: false\n  webhook:\n    enabled: true\n");

    group.bench_function("config_fallback", |b| {
        b.iter(|| config_check.evaluate(black_box(&outputs)))
    });

    group.finish();
}

fn benchmark_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    group.sample_size(20);

    for (groups, checks) in [(1usize, 10usize), (5, 20), (10, 50)] {
        let catalog = create_catalog(groups, checks);
        let probe = create_probe(checks);
        let engine = RulesEngine::new(&probe);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", groups, checks)),
            &catalog,
            |b, catalog| b.iter(|| engine.run(black_box(std::slice::from_ref(catalog)))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_comparisons,
    benchmark_check_evaluation,
    benchmark_engine
);
criterion_main!(benches);
