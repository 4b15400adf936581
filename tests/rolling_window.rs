use dropmerge::RollingWindow;

#[test]
fn empty_window_is_neutral() {
    let window = RollingWindow::new(30);
    assert!(window.is_empty());
    assert_eq!(window.len(), 0);
    assert_eq!(window.mean(), 0.0);
    assert_eq!(window.std_dev(), 0.0);
}

#[test]
fn single_value_has_zero_deviation() {
    let mut window = RollingWindow::new(30);
    window.push(7.0);
    assert_eq!(window.mean(), 7.0);
    assert_eq!(window.std_dev(), 0.0);
}

#[test]
fn window_evicts_oldest_at_capacity() {
    let mut window = RollingWindow::new(5);
    for value in 1..=7 {
        window.push(f64::from(value));
    }

    assert_eq!(window.len(), 5);
    let values: Vec<f64> = window.iter().collect();
    assert_eq!(values, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    assert_eq!(window.mean(), 5.0);
}

#[test]
fn std_dev_is_population_based() {
    let mut window = RollingWindow::new(10);
    for value in [3.0, 4.0, 5.0, 6.0, 7.0] {
        window.push(value);
    }

    // Population variance of {3..7} is 2.
    assert!((window.std_dev() - 2.0_f64.sqrt()).abs() < 1e-12);
}

#[test]
fn zero_capacity_is_clamped_to_one() {
    let mut window = RollingWindow::new(0);
    window.push(1.0);
    window.push(2.0);
    assert_eq!(window.len(), 1);
    assert_eq!(window.mean(), 2.0);
}
