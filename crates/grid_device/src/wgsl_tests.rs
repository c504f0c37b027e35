#[test]
fn grid_wgsl_source_parses_successfully() {
    parse_wgsl("chunk_grid.wgsl", include_str!("chunk_grid.wgsl"));
}

fn parse_wgsl(label: &str, source: &str) {
    naga::front::wgsl::parse_str(source).unwrap_or_else(|error| {
        panic!(
            "WGSL parse failed for {label}: {}",
            error.emit_to_string(source)
        )
    });
}
