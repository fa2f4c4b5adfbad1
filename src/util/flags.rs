macro_rules! set_flag {
    ($target:expr, $value:expr, $flag:expr) => {
        if $value {
            $target |= $flag;
        } else {
            $target &= !$flag;
        }
    };
}

macro_rules! get_flag {
    ($target:expr, $flag:expr) => {
        $target & $flag != 0
    };
}

pub(crate) use get_flag;
pub(crate) use set_flag;
