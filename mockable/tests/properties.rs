// vim: tw=80
//! Getters and setters declared as properties

use std::sync::{Arc, Mutex};

use mockable::*;

#[mockable]
trait Screen {
    #[mockable(get)]
    fn brightness(&self) -> u8;
    #[mockable(set)]
    fn set_brightness(&mut self, brightness: u8);

    #[mockable(get)]
    fn title(&self) -> Option<String>;
    #[mockable(set)]
    fn set_title(&mut self, title: Option<String>);

    #[mockable(set)]
    fn set_contrast(&mut self, contrast: u8);

    fn refresh(&self) -> bool;
}

#[test]
fn getter_will_return() {
    let mock = MockScreen::new();
    given(&mock)
        .brightness().will_return(10)
        .brightness().will_return(20);
    assert_eq!(10, mock.brightness());
    assert_eq!(20, mock.brightness());
    assert_eq!(20, mock.brightness());
}

#[test]
fn getter_will_produce() {
    let mock = MockScreen::new();
    given(&mock).title().will_produce(|| Some("untitled".to_owned()));
    assert_eq!(Some("untitled".to_owned()), mock.title());
}

#[test]
fn optional_getter_defaults_to_none() {
    let mock = MockScreen::new();
    assert_eq!(None, mock.title());
}

#[test]
#[should_panic(expected = "MockScreen::brightness (get)(): No stub configured")]
fn unstubbed_getter() {
    let mock = MockScreen::new();
    mock.brightness();
}

#[test]
fn setters_need_no_stub() {
    let mut mock = MockScreen::new();
    mock.set_brightness(3);
    mock.set_contrast(4);
}

#[test]
fn perform_on_set() {
    let written = Arc::new(Mutex::new(Vec::new()));
    let w = written.clone();
    let mut mock = MockScreen::new();
    when(&mock)
        .set_brightness(mockable::matching(|b: &u8| *b > 50))
        .perform_on_set(move |b| w.lock().unwrap().push(b));
    mock.set_brightness(10);
    mock.set_brightness(80);
    assert_eq!(vec![80], *written.lock().unwrap());
}

#[test]
fn perform_on_set_to_none() {
    let written = Arc::new(Mutex::new(Vec::new()));
    let w = written.clone();
    let mut mock = MockScreen::new();
    when(&mock)
        .set_title(value(None))
        .perform_on_set(move |t| w.lock().unwrap().push(t));
    mock.set_title(None);
    mock.set_title(Some("draft".to_owned()));
    assert_eq!(vec![None::<String>], *written.lock().unwrap());
    verify(&mock)
        .set_title(value(None)).setter_called(1)
        .title().setter_called(2);
}

#[test]
fn perform_on_get() {
    let reads = Arc::new(Mutex::new(0));
    let r = reads.clone();
    let mock = MockScreen::new();
    when(&mock).brightness().perform_on_get(move || *r.lock().unwrap() += 1);
    given(&mock).brightness().will_return(1);
    mock.brightness();
    mock.brightness();
    assert_eq!(2, *reads.lock().unwrap());
}

/// A backing field can be simulated with a pair of actions and a producer
#[test]
fn backing_field() {
    let field = Arc::new(Mutex::new(0u8));
    let f1 = field.clone();
    let f2 = field.clone();
    let mut mock = MockScreen::new();
    when(&mock)
        .brightness().perform_on_set(move |b| *f1.lock().unwrap() = b);
    given(&mock)
        .brightness().will_produce(move || *f2.lock().unwrap());
    mock.set_brightness(42);
    assert_eq!(42, mock.brightness());
}

#[test]
fn reads_and_writes_are_verified_separately() {
    let mut mock = MockScreen::new();
    given(&mock).brightness().will_return(5);
    mock.brightness();
    mock.set_brightness(6);
    mock.set_brightness(7);
    mock.set_title(Some("hello".to_owned()));
    verify(&mock)
        .brightness().getter_called(1)
        .brightness().setter_called(2)
        .set_brightness(value(6)).setter_called(1)
        .set_brightness(any()).getter_called(1)
        .set_title(value(Some("hello".to_owned()))).setter_called(1)
        .title().getter_called(0)
        .set_contrast(any()).setter_called(Count::never());
}

#[test]
fn properties_and_methods_coexist() {
    let mock = MockScreen::new();
    given(&mock).refresh().will_return(true);
    assert!(mock.refresh());
    verify(&mock)
        .refresh().called(1)
        .brightness().getter_called(0);
}
