//! Macros for declaring event specs.

/// Build a `Vec<EventSpec>` from `name: src => dst` entries.
///
/// Sources may be a single state or a bracketed list.
///
/// # Example
///
/// ```
/// use turnstile::builder::MachineBuilder;
/// use turnstile::transitions;
///
/// let mut fsm = MachineBuilder::new()
///     .initial("hungry")
///     .events(transitions![
///         eat: hungry => satisfied,
///         eat: satisfied => full,
///         eat: full => sick,
///         rest: [hungry, satisfied, full, sick] => hungry,
///     ])
///     .build()
///     .unwrap();
///
/// fsm.fire("eat").unwrap();
/// assert!(fsm.is_state("satisfied"));
/// ```
#[macro_export]
macro_rules! transitions {
    (@src [$($src:ident),* $(,)?]) => {
        $crate::definition::Sources::Many(vec![
            $($crate::core::StateName::from(stringify!($src))),*
        ])
    };
    (@src $src:ident) => {
        $crate::definition::Sources::One($crate::core::StateName::from(stringify!($src)))
    };
    ($($name:ident : $src:tt => $dst:ident),* $(,)?) => {
        vec![
            $(
                $crate::definition::EventSpec {
                    name: stringify!($name).to_string(),
                    src: $crate::transitions!(@src $src),
                    dst: $crate::core::StateName::from(stringify!($dst)),
                }
            ),*
        ]
    };
}
